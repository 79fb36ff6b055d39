use eyre::{eyre, Result, WrapErr};
use hmac::{Hmac, Mac};
use percent_encoding::percent_decode_str;
use reqwest::Url;
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Seconds a signed URL stays valid.
pub const TEMP_URL_LIFETIME_SECS: i64 = 300;

/// Source of the current Unix time used for signature expiry.
pub trait Clock {
    fn now(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock frozen at a given Unix time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Signature and expiry for one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempUrl {
    pub signature: String,
    pub expires: i64,
}

impl TempUrl {
    /// Append the signature query parameters to `object_url`.
    pub fn apply(&self, object_url: &str) -> String {
        format!(
            "{object_url}?temp_url_sig={}&temp_url_expires={}",
            self.signature, self.expires
        )
    }
}

/// Produces Swift temp URL signatures with the container's shared secret.
#[derive(Clone)]
pub struct TempUrlSigner {
    key: String,
}

impl TempUrlSigner {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// HMAC-SHA1 over `<method>\n<expires>\n<path>` where
    /// `expires = now + TEMP_URL_LIFETIME_SECS`.
    pub fn sign(&self, method: &str, path: &str, now: i64) -> Result<TempUrl> {
        let expires = now + TEMP_URL_LIFETIME_SECS;
        let body = format!("{method}\n{expires}\n{path}");
        let mut mac = HmacSha1::new_from_slice(self.key.as_bytes())
            .map_err(|err| eyre!("invalid temp url key: {err}"))?;
        mac.update(body.as_bytes());
        Ok(TempUrl {
            signature: hex::encode(mac.finalize().into_bytes()),
            expires,
        })
    }

    /// Sign a PUT to `object_url` valid from `clock.now()`.
    pub fn sign_put(&self, object_url: &str, clock: &dyn Clock) -> Result<TempUrl> {
        let path = object_path(object_url)?;
        self.sign("PUT", &path, clock.now())
    }
}

impl std::fmt::Debug for TempUrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempUrlSigner").finish_non_exhaustive()
    }
}

/// Path component of an object URL in the decoded form Swift signs against.
pub fn object_path(object_url: &str) -> Result<String> {
    let url = Url::parse(object_url)
        .wrap_err_with(|| format!("invalid destination url {object_url}"))?;
    let decoded = percent_decode_str(url.path())
        .decode_utf8()
        .wrap_err_with(|| format!("destination path of {object_url} is not utf-8"))?;
    Ok(decoded.into_owned())
}
