use std::io::{stdout, BufWriter};

use crate::config::Profile;
use crate::listing::{list_keys, ListParams, ObjectLister};

use anyhow::Result;

/// Merges command line values with the selected profile. Command line wins.
pub fn list_params(
    bucket: Option<String>,
    prefix: Option<String>,
    recursive: bool,
    profile: Option<&Profile>,
) -> ListParams {
    ListParams {
        bucket: or_profile(bucket, profile.map(|p| &p.bucket)),
        prefix: or_profile(prefix, profile.map(|p| &p.prefix)).unwrap_or_default(),
        recursive,
    }
}

fn or_profile(val: Option<String>, fallback: Option<&String>) -> Option<String> {
    val.or_else(|| fallback.filter(|v| !v.is_empty()).cloned())
}

pub async fn cmd_list<L>(cl: &L, params: &ListParams) -> Result<()>
where
    L: ObjectLister + Sync,
{
    let out = stdout();
    let mut out = BufWriter::new(out.lock());

    let lines = list_keys(cl, params, &mut out).await?;
    log::debug!("printed {} entries", lines);

    Ok(())
}
