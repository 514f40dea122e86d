//! Registry credentials taken from the host's Docker configuration

use std::fmt::Debug;

use bollard::auth::DockerCredentials;
use docker_credential::DockerCredential;
use tracing::debug;

const DOCKER_HUB: &str = "docker.io";

/// Key the Docker CLI stores Docker Hub logins under
const DOCKER_HUB_SERVER: &str = "https://index.docker.io/v1/";

/// Registry host of an image reference such as `host:5000/name:tag`.
///
/// A first path component without a `.` or `:` (and not `localhost`) is a
/// Docker Hub namespace.
pub fn registry_host(reference: &str) -> &str {
    match reference.split_once('/') {
        Some((first, _)) if first.contains('.') || first.contains(':') || first == "localhost" => {
            first
        }
        _ => DOCKER_HUB,
    }
}

/// Server address used as the config key for `host`
pub fn server_address(host: &str) -> &str {
    match host {
        "docker.io" | "index.docker.io" | "registry-1.docker.io" => DOCKER_HUB_SERVER,
        other => other,
    }
}

fn to_engine_credentials(credential: DockerCredential, server: &str) -> DockerCredentials {
    match credential {
        DockerCredential::UsernamePassword(username, password) => DockerCredentials {
            username: Some(username),
            password: Some(password),
            serveraddress: Some(server.to_string()),
            ..Default::default()
        },
        DockerCredential::IdentityToken(token) => DockerCredentials {
            identitytoken: Some(token),
            serveraddress: Some(server.to_string()),
            ..Default::default()
        },
    }
}

/// Credentials for the registry serving `reference`, if the host has any
pub fn lookup(reference: &str) -> Option<DockerCredentials> {
    lookup_with(reference, docker_credential::get_credential)
}

/// [`lookup`] with a custom credential source
pub fn lookup_with<F, E>(reference: &str, fetch: F) -> Option<DockerCredentials>
where
    F: FnOnce(&str) -> Result<DockerCredential, E>,
    E: Debug,
{
    let server = server_address(registry_host(reference));
    match fetch(server) {
        Ok(credential) => {
            debug!(server, "Using registry credentials from the Docker config");
            Some(to_engine_credentials(credential, server))
        }
        Err(e) => {
            debug!(server, error = ?e, "No registry credentials, continuing anonymously");
            None
        }
    }
}
