//! Semantic version strings
//!
//! A [`VersionString`] is the value pushed into every store on a bump. It is
//! only ever produced by parsing, so holding one means the text already
//! matches the SemVer 2.0.0 grammar.

use regex::Regex;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

// ASCII digits only; `\d` is Unicode-aware in `regex`.
const SEMVER_PATTERN: &str = concat!(
    r"^(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)\.(0|[1-9][0-9]*)",
    r"(?:-((?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9][0-9]*|[0-9]*[a-zA-Z-][0-9a-zA-Z-]*))*))?",
    r"(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
);

fn semver_regex() -> &'static Regex {
    static SEMVER: OnceLock<Regex> = OnceLock::new();
    SEMVER.get_or_init(|| Regex::new(SEMVER_PATTERN).expect("semver pattern is valid"))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{input}' is not a semantic version (expected MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD])")]
pub struct InvalidVersion {
    pub input: String,
}

/// A validated `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]` version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionString {
    raw: String,
    major: u64,
    minor: u64,
    patch: u64,
    prerelease: Option<String>,
    build: Option<String>,
}

impl VersionString {
    pub fn parse(input: &str) -> Result<Self, InvalidVersion> {
        let invalid = || InvalidVersion {
            input: input.to_string(),
        };
        let caps = semver_regex().captures(input).ok_or_else(invalid)?;
        let number = |idx: usize| -> Result<u64, InvalidVersion> {
            caps.get(idx)
                .ok_or_else(invalid)?
                .as_str()
                .parse::<u64>()
                .map_err(|_| invalid())
        };

        Ok(Self {
            raw: input.to_string(),
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            prerelease: caps.get(4).map(|m| m.as_str().to_string()),
            build: caps.get(5).map(|m| m.as_str().to_string()),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn prerelease(&self) -> Option<&str> {
        self.prerelease.as_deref()
    }

    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }
}

impl FromStr for VersionString {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for VersionString {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Serialize for VersionString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for VersionString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        VersionString::parse(&raw).map_err(de::Error::custom)
    }
}
