use std::io::Write;

use crate::error::{Error, Result};
use crate::projector::KeyProjector;

use async_trait::async_trait;

/// One batch of keys returned by the object store.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub bucket: String,
    pub prefix: String,
    pub keys: Vec<String>,
    pub next_token: Option<String>,
    pub truncated: bool,
}

impl Page {
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }
}

/// Paginated access to the keys of a bucket.
#[async_trait]
pub trait ObjectLister {
    /// Fetches the first page of keys under `prefix`.
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Page>;

    /// Fetches the page following `page`. Only called when `page` is truncated.
    async fn list_next_batch(&self, page: &Page) -> Result<Page>;
}

#[derive(Debug, Clone)]
pub struct ListParams {
    pub bucket: Option<String>,
    pub prefix: String,
    pub recursive: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        ListParams {
            bucket: None,
            prefix: "".to_string(),
            recursive: true,
        }
    }
}

impl ListParams {
    /// Returns the bucket to list, or the missing parameters.
    pub fn check(&self) -> Result<&str> {
        match self.bucket.as_deref() {
            Some(bucket) if !bucket.is_empty() => Ok(bucket),
            _ => Err(Error::MissingParameters(vec!["bucket name"])),
        }
    }
}

/// Lists every key under the configured prefix and writes the projected
/// lines to `out`, in the order the store returns them.
///
/// Returns the number of lines written. Lines written before an error are
/// left in place.
pub async fn list_keys<L, W>(lister: &L, params: &ListParams, out: &mut W) -> Result<usize>
where
    L: ObjectLister + Sync + ?Sized,
    W: Write,
{
    let bucket = params.check()?;
    let mut projector = KeyProjector::new(&params.prefix, params.recursive);
    let mut emitted = 0;
    let mut pages = 1;

    log::debug!(
        "listing bucket={}\tprefix={}\trecursive={}",
        bucket,
        &params.prefix,
        params.recursive
    );

    let mut page = lister.list_objects(bucket, &params.prefix).await?;

    loop {
        log::debug!("processing page={}\tkeys={}", pages, page.keys().len());

        for key in page.keys() {
            if let Some(line) = projector.project(key) {
                writeln!(out, "{}", line)?;
                emitted += 1;
            }
        }

        if !page.is_truncated() {
            break;
        }

        page = lister.list_next_batch(&page).await?;
        pages += 1;
    }

    out.flush()?;

    log::debug!("listed pages={}\tlines={}", pages, emitted);

    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves a fixed sequence of pages and counts the calls made.
    struct StubLister {
        pages: Mutex<Vec<Vec<&'static str>>>,
        fail_on: Option<usize>,
        calls: AtomicUsize,
    }

    impl StubLister {
        fn new(pages: Vec<Vec<&'static str>>) -> Self {
            StubLister {
                pages: Mutex::new(pages),
                fail_on: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(mut self, call: usize) -> Self {
            self.fail_on = Some(call);
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn next_page(&self, bucket: &str, prefix: &str) -> Result<Page> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on == Some(call) {
                return Err(Error::remote(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "access denied",
                )));
            }

            let mut pages = self.pages.lock().unwrap();
            let keys = if pages.is_empty() {
                vec![]
            } else {
                pages.remove(0)
            };

            Ok(Page {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                keys: keys.into_iter().map(str::to_string).collect(),
                next_token: Some(format!("token-{}", call)),
                truncated: !pages.is_empty(),
            })
        }
    }

    #[async_trait]
    impl ObjectLister for StubLister {
        async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Page> {
            self.next_page(bucket, prefix)
        }

        async fn list_next_batch(&self, page: &Page) -> Result<Page> {
            assert!(page.is_truncated());
            self.next_page(&page.bucket, &page.prefix)
        }
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn params(bucket: &str, prefix: &str, recursive: bool) -> ListParams {
        ListParams {
            bucket: Some(bucket.to_string()),
            prefix: prefix.to_string(),
            recursive,
        }
    }

    async fn run(lister: &StubLister, params: &ListParams) -> (Result<usize>, Vec<String>) {
        let mut out = Vec::new();
        let res = list_keys(lister, params, &mut out).await;
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();

        (res, lines)
    }

    #[tokio::test]
    async fn lists_flat_bucket() {
        let lister = StubLister::new(vec![vec!["a.txt", "b.txt"]]);
        let (res, lines) = run(&lister, &params("bucket", "", true)).await;

        assert_eq!(res.unwrap(), 2);
        assert_eq!(lines, vec!["a.txt", "b.txt"]);
        assert_eq!(lister.calls(), 1);
    }

    #[tokio::test]
    async fn recursive_listing_is_relative_to_prefix() {
        let lister = StubLister::new(vec![vec![
            "logs/2024/01.log",
            "logs/2024/02.log",
            "logs/2025/01.log",
        ]]);
        let (res, lines) = run(&lister, &params("bucket", "logs/", true)).await;

        assert_eq!(res.unwrap(), 3);
        assert_eq!(lines, vec!["2024/01.log", "2024/02.log", "2025/01.log"]);
    }

    #[tokio::test]
    async fn non_recursive_listing_reports_first_segments() {
        let lister = StubLister::new(vec![vec![
            "logs/2024/01.log",
            "logs/2024/02.log",
            "logs/2025/01.log",
        ]]);
        let (res, lines) = run(&lister, &params("bucket", "logs/", false)).await;

        assert_eq!(res.unwrap(), 2);
        assert_eq!(lines, vec!["2024", "2025"]);
    }

    #[tokio::test]
    async fn non_recursive_listing_collapses_nested_keys() {
        let lister = StubLister::new(vec![vec!["x", "x/y", "x/z"]]);
        let (res, lines) = run(&lister, &params("bucket", "", false)).await;

        assert_eq!(res.unwrap(), 1);
        assert_eq!(lines, vec!["x"]);
    }

    #[tokio::test]
    async fn follows_truncated_pages() {
        let lister = StubLister::new(vec![vec!["p/a"], vec!["p/b"]]);
        let (res, lines) = run(&lister, &params("bucket", "p/", true)).await;

        assert_eq!(res.unwrap(), 2);
        assert_eq!(lines, vec!["a", "b"]);
        assert_eq!(lister.calls(), 2);
    }

    #[tokio::test]
    async fn output_does_not_depend_on_page_split() {
        let keys = vec!["d/1", "d/2/x", "e", "d/2/y", "f/g", "e"];

        for recursive in [true, false] {
            let whole = StubLister::new(vec![keys.clone()]);
            let (_, expected) = run(&whole, &params("bucket", "", recursive)).await;

            let single = StubLister::new(keys.iter().map(|key| vec![*key]).collect());
            let (_, lines) = run(&single, &params("bucket", "", recursive)).await;
            assert_eq!(lines, expected);
            assert_eq!(single.calls(), keys.len());

            let uneven = StubLister::new(vec![keys[..1].to_vec(), vec![], keys[1..].to_vec()]);
            let (_, lines) = run(&uneven, &params("bucket", "", recursive)).await;
            assert_eq!(lines, expected);
        }
    }

    #[tokio::test]
    async fn recursive_line_count_matches_key_count() {
        let lister = StubLister::new(vec![vec!["a", "a", "b/c"], vec!["b/c", "d"]]);
        let (res, lines) = run(&lister, &params("bucket", "", true)).await;

        assert_eq!(res.unwrap(), 5);
        assert_eq!(lines.len(), 5);
    }

    #[tokio::test]
    async fn missing_bucket_fails_before_listing() {
        let lister = StubLister::new(vec![vec!["a"]]);

        for bucket in [None, Some("".to_string())] {
            let params = ListParams {
                bucket,
                ..Default::default()
            };
            let (res, lines) = run(&lister, &params).await;

            assert!(matches!(res, Err(Error::MissingParameters(ref f)) if f == &["bucket name"]));
            assert!(lines.is_empty());
        }

        assert_eq!(lister.calls(), 0);
    }

    #[tokio::test]
    async fn remote_error_is_fatal_and_keeps_partial_output() {
        let lister = StubLister::new(vec![vec!["a"], vec!["b"]]).failing_on(2);
        let (res, lines) = run(&lister, &params("bucket", "", true)).await;

        let err = res.unwrap_err();
        assert!(matches!(err, Error::Remote(_)));
        assert_eq!(
            std::error::Error::source(&err).unwrap().to_string(),
            "access denied"
        );
        assert_eq!(lines, vec!["a"]);
        assert_eq!(lister.calls(), 2);
    }

    #[tokio::test]
    async fn write_failure_is_an_output_error() {
        let lister = StubLister::new(vec![vec!["a"]]);
        let res = list_keys(&lister, &params("bucket", "", true), &mut BrokenSink).await;

        assert!(matches!(res, Err(Error::Output(_))));
    }
}
