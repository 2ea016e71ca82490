use crate::config::Profile;
use crate::error::{Error, Result};
use crate::listing::{ObjectLister, Page};

use async_trait::async_trait;
use aws_sdk_s3::config::Builder as ConfigBuilder;
use aws_sdk_s3::output::ListObjectsV2Output;
use aws_sdk_s3::{Client, Credentials, Region};

#[derive(Default)]
pub struct ClientOptions<'a> {
    pub profile: Option<&'a Profile>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub max_keys: Option<i32>,
}

/// Inputs of a single `ListObjectsV2` call.
#[derive(Debug, PartialEq)]
struct PageRequest<'a> {
    bucket: &'a str,
    prefix: &'a str,
    continuation_token: Option<&'a str>,
}

impl<'a> PageRequest<'a> {
    fn first(bucket: &'a str, prefix: &'a str) -> Self {
        PageRequest {
            bucket,
            prefix,
            continuation_token: None,
        }
    }

    fn after(page: &'a Page) -> Self {
        PageRequest {
            bucket: &page.bucket,
            prefix: &page.prefix,
            continuation_token: page.next_token.as_deref(),
        }
    }
}

pub struct S3Client {
    cl: Client,
    max_keys: Option<i32>,
}

impl S3Client {
    pub async fn new(opts: ClientOptions<'_>) -> S3Client {
        let mut loader = aws_config::from_env();
        let mut region = opts.region;
        let mut endpoint_url = opts.endpoint_url;

        if let Some(profile) = opts.profile {
            let creds =
                Credentials::new(&profile.access_key, &profile.secret_key, None, None, "s3ls");
            loader = loader.credentials_provider(creds);

            if region.is_none() && !profile.region.is_empty() {
                region = Some(profile.region.to_string());
            }
            if endpoint_url.is_none() {
                endpoint_url = profile.endpoint.clone();
            }
        }

        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }

        let cfg = loader.load().await;
        let mut builder = ConfigBuilder::from(&cfg);

        if let Some(url) = endpoint_url {
            log::debug!("using endpoint {}", &url);
            builder = builder.endpoint_url(url).force_path_style(true);
        }

        let cl = Client::from_conf(builder.build());

        S3Client {
            cl,
            max_keys: opts.max_keys,
        }
    }

    async fn list_page(&self, req: PageRequest<'_>) -> Result<Page> {
        let resp = self
            .cl
            .list_objects_v2()
            .bucket(req.bucket)
            .prefix(req.prefix)
            .set_max_keys(self.max_keys)
            .set_continuation_token(req.continuation_token.map(str::to_string))
            .send()
            .await
            .map_err(Error::remote)?;

        Ok(to_page(req.bucket, req.prefix, resp))
    }
}

fn to_page(bucket: &str, prefix: &str, resp: ListObjectsV2Output) -> Page {
    let keys = resp
        .contents()
        .unwrap_or_default()
        .iter()
        .filter_map(|item| item.key())
        .map(str::to_string)
        .collect();

    let next_token = resp.next_continuation_token().map(str::to_string);
    let mut truncated = resp.is_truncated();

    if truncated && next_token.is_none() {
        log::warn!("truncated listing without continuation token, stopping");
        truncated = false;
    }

    Page {
        bucket: bucket.to_string(),
        prefix: prefix.to_string(),
        keys,
        next_token,
        truncated,
    }
}

#[async_trait]
impl ObjectLister for S3Client {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Page> {
        self.list_page(PageRequest::first(bucket, prefix)).await
    }

    async fn list_next_batch(&self, page: &Page) -> Result<Page> {
        self.list_page(PageRequest::after(page)).await
    }
}
