use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::sync::Arc;
use uuid::Uuid;
use vizora_core::{CredentialType, DeviceClaims, DisplayId};
use vizora_ports::{Clock, CredentialError, CredentialIssuer};

/// HS256 JWT device credentials
///
/// Expiry is checked against the injected clock rather than wall time, so
/// the library's own `exp` check is disabled.
pub struct JwtCredentialIssuer<C: Clock> {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    validity: Duration,
    clock: Arc<C>,
}

impl<C: Clock> JwtCredentialIssuer<C> {
    pub fn new(key: impl AsRef<[u8]>, validity: Duration, clock: Arc<C>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(key.as_ref()),
            decoding_key: DecodingKey::from_secret(key.as_ref()),
            validation,
            validity,
            clock,
        }
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> CredentialError {
    match e.kind() {
        ErrorKind::InvalidSignature => CredentialError::SignatureInvalid,
        ErrorKind::ExpiredSignature => CredentialError::Expired,
        _ => CredentialError::Malformed(e.to_string()),
    }
}

impl<C: Clock> CredentialIssuer for JwtCredentialIssuer<C> {
    fn issue(
        &self,
        display_id: DisplayId,
        device_identifier: &str,
        organization_id: &str,
    ) -> Result<String, CredentialError> {
        let now = self.clock.now();
        let claims = DeviceClaims {
            sub: display_id,
            jti: Uuid::new_v4(),
            device_identifier: device_identifier.to_string(),
            organization_id: organization_id.to_string(),
            credential_type: CredentialType::Device,
            iat: now.timestamp(),
            exp: (now + self.validity).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CredentialError::Signing(e.to_string()))
    }

    fn validate(&self, token: &str) -> Result<DeviceClaims, CredentialError> {
        let claims = decode::<DeviceClaims>(token, &self.decoding_key, &self.validation)
            .map_err(map_decode_error)?
            .claims;

        if claims.credential_type != CredentialType::Device {
            return Err(CredentialError::WrongType);
        }
        if claims.is_expired_at(self.clock.now().timestamp()) {
            return Err(CredentialError::Expired);
        }
        Ok(claims)
    }
}
