use async_trait::async_trait;
use darbar_core::identity::{IdentityProvider, IdentityRecord, NewIdentity};
use darbar_core::{CoreError, CoreResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

const SERVICE: &str = "Identity";

/// Email/password accounts in the hosted identity service (Identity Toolkit REST API).
pub struct FirebaseAuth {
    api_key: String,
    access_token: String,
    url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    id_token: String,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    #[serde(default)]
    email_verified: bool,
}

/// Map the service's error codes (`EMAIL_EXISTS`, `INVALID_PASSWORD : ...`) to core errors.
pub fn map_identity_error(code: &str) -> CoreError {
    let code = code.split(':').next().unwrap_or_default().trim();
    match code {
        "EMAIL_EXISTS" => CoreError::Conflict("User with this email already exists".to_string()),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" | "USER_DISABLED" => {
            CoreError::InvalidCredentials
        }
        "USER_NOT_FOUND" => CoreError::NotFound("User".to_string()),
        "WEAK_PASSWORD" => CoreError::ValidationError("Password is too weak".to_string()),
        other => CoreError::gateway(SERVICE, other.to_string()),
    }
}

impl FirebaseAuth {
    pub fn new(api_key: String, access_token: String, url: String) -> Self {
        Self {
            api_key,
            access_token,
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value, bearer: Option<&str>) -> CoreResult<T> {
        let mut request = self
            .client
            .post(format!("{}/accounts:{}", self.url, method))
            .query(&[("key", &self.api_key)])
            .json(&payload);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            error!("Identity request {} failed: {}", method, e);
            CoreError::gateway(SERVICE, "Identity service unavailable")
        })?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| CoreError::gateway(SERVICE, format!("Bad response format: {}", e)))?;

        if !status.is_success() {
            let code = body["error"]["message"].as_str().unwrap_or("UNKNOWN");
            warn!("Identity call {} rejected: {}", method, code);
            return Err(map_identity_error(code));
        }

        serde_json::from_value(body).map_err(|e| CoreError::gateway(SERVICE, format!("Bad response format: {}", e)))
    }

    async fn email_verified(&self, id_token: &str) -> bool {
        match self
            .call::<LookupResponse>("lookup", json!({ "idToken": id_token }), None)
            .await
        {
            Ok(lookup) => lookup.users.first().map(|u| u.email_verified).unwrap_or(false),
            Err(e) => {
                warn!("Identity lookup failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    async fn create_user(&self, identity: &NewIdentity) -> CoreResult<IdentityRecord> {
        let created: AuthResponse = self
            .call(
                "signUp",
                json!({
                    "email": identity.email,
                    "password": identity.password,
                    "displayName": identity.display_name,
                    "returnSecureToken": true
                }),
                None,
            )
            .await?;

        info!("Identity created: {}", created.local_id);
        Ok(IdentityRecord {
            uid: created.local_id,
            email: created.email,
            display_name: Some(identity.display_name.clone()),
            email_verified: false,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> CoreResult<IdentityRecord> {
        let signed_in: AuthResponse = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
                None,
            )
            .await?;

        let email_verified = self.email_verified(&signed_in.id_token).await;
        Ok(IdentityRecord {
            uid: signed_in.local_id,
            email: signed_in.email,
            display_name: signed_in.display_name.filter(|name| !name.is_empty()),
            email_verified,
        })
    }

    async fn change_password(&self, email: &str, current_password: &str, new_password: &str) -> CoreResult<()> {
        let signed_in: AuthResponse = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": current_password, "returnSecureToken": true }),
                None,
            )
            .await?;

        let _: Value = self
            .call(
                "update",
                json!({ "idToken": signed_in.id_token, "password": new_password, "returnSecureToken": false }),
                None,
            )
            .await?;
        info!("Password changed for {}", signed_in.local_id);
        Ok(())
    }

    async fn delete_user(&self, uid: &str) -> CoreResult<()> {
        let _: Value = self
            .call("delete", json!({ "localId": uid }), Some(&self.access_token))
            .await?;
        info!("Identity deleted: {}", uid);
        Ok(())
    }
}
