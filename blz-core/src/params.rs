//! Codec parameters attached to every `BArray`/`BTable`: compression level,
//! whether to shuffle bytes before compressing, and which compressor to use.

use crate::codec::compressor_names;
use crate::error::{BlzError, Result};
use serde::{Deserialize, Serialize};

/// Default compression level, matching the reference library's default.
pub const DEFAULT_CLEVEL: u8 = 5;
pub const MAX_CLEVEL: u8 = 9;
pub const DEFAULT_CNAME: &str = "zstd";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    clevel: u8,
    shuffle: bool,
    cname: String,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            clevel: DEFAULT_CLEVEL,
            shuffle: true,
            cname: DEFAULT_CNAME.to_string(),
        }
    }
}

impl Params {
    /// Builds validated params. `clevel` must be `0..=9`; `cname` must name a
    /// registered compressor.
    pub fn new(clevel: u8, shuffle: bool, cname: impl Into<String>) -> Result<Self> {
        if clevel > MAX_CLEVEL {
            return Err(BlzError::Value(format!(
                "clevel must be between 0 and {MAX_CLEVEL}, got {clevel}"
            )));
        }
        let cname = cname.into();
        if !compressor_names().contains(&cname.as_str()) {
            return Err(BlzError::Value(format!(
                "unsupported cname '{cname}', available: {:?}",
                compressor_names()
            )));
        }
        Ok(Params {
            clevel,
            shuffle,
            cname,
        })
    }

    pub fn clevel(&self) -> u8 {
        self.clevel
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn cname(&self) -> &str {
        &self.cname
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let p = Params::default();
        assert_eq!(p.clevel(), DEFAULT_CLEVEL);
        assert!(p.shuffle());
        assert_eq!(p.cname(), DEFAULT_CNAME);
    }

    #[test]
    fn rejects_bad_clevel() {
        assert!(Params::new(10, true, "zstd").is_err());
    }

    #[test]
    fn rejects_unknown_cname() {
        assert!(Params::new(5, true, "blosclz").is_err());
    }
}
