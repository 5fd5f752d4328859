use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{ApiClient, Endpoint, HttpStatusError};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Skips TLS certificate validation. Appliances ship self-signed
    /// certificates, so this defaults to on in the config layer.
    pub accept_invalid_certs: bool,
    pub page_size: u32,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    access_token: String,
}

/// An authenticated connection to one appliance, valid for a single run.
pub struct Session {
    client: Client,
    base_uri: String,
    host: String,
    user: String,
    token: String,
    page_size: u32,
}

impl Session {
    /// Logs in and keeps the bearer token. Every failure here is an
    /// authentication failure and names the target host.
    pub fn authenticate(
        endpoint: &Endpoint,
        user: &str,
        password: &str,
        opts: &SessionOptions,
    ) -> Result<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(opts.accept_invalid_certs)
            .build()
            .context("failed to build the HTTP client")
            .map_err(crate::exit::invalid_args_err)?;

        Self::login(client, endpoint.base_uri(), &endpoint.host, user, password, opts.page_size)
    }

    fn login(
        client: Client,
        base_uri: String,
        host: &str,
        user: &str,
        password: &str,
        page_size: u32,
    ) -> Result<Self> {
        let url = format!("{base_uri}/login");
        let response = client
            .post(&url)
            .json(&LoginRequest {
                username: user,
                password,
            })
            .send()
            .map_err(|err| crate::exit::auth_failed(format!("Error connecting to {host}: {err}")))?;

        let status = response.status();
        debug!(method = "POST", path = "/login", status = status.as_u16(), "api call");
        if status != StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(crate::exit::auth_failed(format!(
                "Login failed for user: {user} on {host}, code: {}, body: {body}",
                status.as_u16()
            )));
        }

        let login: LoginResponse = response.json().map_err(|err| {
            crate::exit::auth_failed(format!(
                "Login to {host} did not return an access token: {err}"
            ))
        })?;
        info!(host, user, "authenticated");

        Ok(Self {
            client,
            base_uri,
            host: host.to_string(),
            user: user.to_string(),
            token: login.access_token,
            page_size,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Ends the session. The appliance answers `204 No Content` on success.
    pub fn logout(self) -> Result<()> {
        let url = format!("{}/logout", self.base_uri);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .with_context(|| format!("The call POST {url} failed"))?;
        let status = response.status();
        debug!(method = "POST", path = "/logout", status = status.as_u16(), "api call");
        if status != StatusCode::NO_CONTENT {
            let body = response.text().unwrap_or_default();
            return Err(HttpStatusError {
                method: "POST",
                url,
                status: status.as_u16(),
                body,
            }
            .into());
        }
        Ok(())
    }
}

impl ApiClient for Session {
    fn get(&self, path: &str, query: &[(&'static str, String)]) -> Result<Value> {
        let url = format!("{}{path}", self.base_uri);
        let mut params = query.to_vec();
        params.push(("pageSize", self.page_size.to_string()));

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .with_context(|| format!("The call GET {url} failed"))
            .map_err(crate::exit::api_request_err)?;

        let status = response.status();
        let full_url = response.url().to_string();
        debug!(method = "GET", path, status = status.as_u16(), "api call");
        if status != StatusCode::OK {
            let body = response.text().unwrap_or_default();
            return Err(crate::exit::api_request_err(
                HttpStatusError {
                    method: "GET",
                    url: full_url,
                    status: status.as_u16(),
                    body,
                }
                .into(),
            ));
        }

        let body = response
            .text()
            .with_context(|| format!("failed to read the response of GET {full_url}"))
            .map_err(crate::exit::api_request_err)?;
        serde_json::from_str(&body)
            .with_context(|| format!("GET {full_url} returned malformed JSON"))
            .map_err(crate::exit::api_request_err)
    }
}
