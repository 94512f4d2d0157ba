//! Request identity keys for bucket entries.

use sha2::{Digest, Sha256};
use url::Url;

/// The URL an entry is stored under: the request URL without its fragment.
pub fn canonical_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.into()
}

/// Compute the key of a bucket entry from the request method and URL.
///
/// The method is upper-cased so `get` and `GET` address the same entry, and
/// the fragment is dropped so `/logo.png#v2` and `/logo.png` do too.
pub fn compute_entry_key(method: &str, url: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(canonical_url(url).as_bytes());
    hex::encode(hasher.finalize())
}
