use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::{CookieConfig, SameSitePolicy};
use crate::services::jwt::CredentialPair;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

fn same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::None => SameSite::None,
    }
}

fn credential_cookie(
    name: &'static str,
    value: String,
    max_age_seconds: i64,
    config: &CookieConfig,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(config.secure)
        .same_site(same_site(config.same_site))
        .path("/")
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}

/// Attach both credentials as HTTP-only cookies.
pub fn set_credentials(
    jar: CookieJar,
    pair: &CredentialPair,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    config: &CookieConfig,
) -> CookieJar {
    jar.add(credential_cookie(
        ACCESS_TOKEN_COOKIE,
        pair.access_token.clone(),
        access_ttl_seconds,
        config,
    ))
    .add(credential_cookie(
        REFRESH_TOKEN_COOKIE,
        pair.refresh_token.clone(),
        refresh_ttl_seconds,
        config,
    ))
}

/// Emit expired cookies for both credentials, whether or not the client
/// sent them.
pub fn clear_credentials(jar: CookieJar, config: &CookieConfig) -> CookieJar {
    [ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| {
            let mut cookie = credential_cookie(name, String::new(), 0, config);
            cookie.make_removal();
            jar.add(cookie)
        })
}
