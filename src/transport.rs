//! Reading and writing the session cookie

use salvo_core::http::cookie::{Cookie, CookieJar};
use salvo_core::http::{Request, Response};

/// Where the incoming session cookie is read from
pub trait CookieSource {
    fn cookie_value(&self, name: &str) -> Option<String>;
}

/// Where the outgoing session cookie is written to
pub trait CookieSink {
    fn set_cookie(&mut self, cookie: Cookie<'static>);
}

impl CookieSource for Request {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|c| c.value().to_string())
    }
}

impl CookieSink for Response {
    fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.add_cookie(cookie);
    }
}

impl CookieSource for CookieJar {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.get(name).map(|c| c.value().to_string())
    }
}

impl CookieSink for CookieJar {
    fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.add(cookie);
    }
}
