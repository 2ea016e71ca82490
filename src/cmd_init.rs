use std::fmt::Display;
use std::fs;
use std::io::{stdin, stdout, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{Config, Profile};

use anyhow::{bail, Context, Result};

pub fn cmd_init(profile_name: &str) -> Result<()> {
    let stdin = stdin();
    let mut prompt = Prompt {
        input: stdin.lock(),
        output: stdout(),
    };

    let profiles_file = cmd_init_at(&Config::config_dir()?, profile_name, &mut prompt)?;
    log::info!("saved profile {} to {}", profile_name, profiles_file.display());

    Ok(())
}

/// Adds a new profile to the profiles file in `dir`, returning the file path.
pub fn cmd_init_at<R: BufRead, W: Write>(
    dir: &Path,
    profile_name: &str,
    prompt: &mut Prompt<R, W>,
) -> Result<PathBuf> {
    if !dir.exists() {
        fs::create_dir_all(dir).context("failed to create config directory")?;
    }

    let profiles_file = Config::profiles_file_in(dir);
    let mut cfg = if !profiles_file.exists() {
        Config::default()
    } else {
        Config::load_from(&profiles_file)?
    };

    if cfg.profile(profile_name).is_some() {
        bail!("profile {} already exists", profile_name);
    }

    let profile = prompt.profile()?;

    cfg.set_profile(profile_name, profile);
    cfg.save_to(&profiles_file)?;

    Ok(profiles_file)
}

pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    fn profile(&mut self) -> Result<Profile> {
        let endpoint = self.input_default("S3 Endpoint URL (empty for AWS)", String::new())?;

        Ok(Profile {
            access_key: self.input("S3 Access Key")?,
            secret_key: self.input("S3 Secret Key")?,
            region: self.input_default("S3 Region", "us-east-1".to_string())?,
            endpoint: Some(endpoint).filter(|url| !url.is_empty()),
            bucket: self.input_default("Default Bucket Name", String::new())?,
            prefix: self.input_default("Default Key Prefix", String::new())?,
        })
    }

    fn read_line(&mut self) -> Result<String> {
        let mut val = String::new();
        let n = self
            .input
            .read_line(&mut val)
            .context("failed to read input line")?;
        if n == 0 {
            bail!("unexpected end of input");
        }

        Ok(val.trim_end().to_string())
    }

    fn input(&mut self, prompt: &str) -> Result<String> {
        loop {
            write!(self.output, "{}: ", prompt)?;
            self.output.flush()?;

            let val = self.read_line()?;
            if !val.is_empty() {
                return Ok(val);
            }
        }
    }

    fn input_default<T>(&mut self, prompt: &str, def: T) -> Result<T>
    where
        T: Display + FromStr,
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        write!(self.output, "{} [{}]: ", prompt, def)?;
        self.output.flush()?;

        let val = self.read_line()?;
        if val.is_empty() {
            return Ok(def);
        }

        val.parse()
            .with_context(|| format!("failed to parse value {:?}", val))
    }
}
