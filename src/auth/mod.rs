//! Session bootstrap: credential records, cookie jar and login validation.
//!
//! Credentials come from a browser cookie export (JSON). They are installed
//! into a cookie jar scoped to the catalog origin and validated with one
//! authenticated probe before anything else touches the network.

mod cookies;
mod session;

pub use cookies::{
    CookieError, CookieRecord, ParsedCookies, load_cookies_into_jar, parse_cookie_records,
    read_cookie_file,
};
pub use session::{Session, SessionError, UserData};
