//! Pre-flight check for AWS credentials in the environment.

use thiserror::Error;

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_PROFILE: &str = "AWS_PROFILE";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CredentialError {
    #[error("AWS credentials not found: set AWS_PROFILE or both AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY")]
    Missing,
}

/// Which credentials terraform will pick up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwsCredentialSource {
    Profile(String),
    StaticKeys,
}

pub fn check_aws() -> Result<AwsCredentialSource, CredentialError> {
    check_aws_with(|key| std::env::var(key).ok())
}

/// Same as [`check_aws`] with an injectable variable lookup. Empty values
/// count as unset.
pub fn check_aws_with<F>(lookup: F) -> Result<AwsCredentialSource, CredentialError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if get(AWS_ACCESS_KEY_ID).is_some() && get(AWS_SECRET_ACCESS_KEY).is_some() {
        return Ok(AwsCredentialSource::StaticKeys);
    }
    if let Some(profile) = get(AWS_PROFILE) {
        return Ok(AwsCredentialSource::Profile(profile));
    }
    Err(CredentialError::Missing)
}
