use crate::error::{LoginError, LoginResult};
use crate::messages::{Action, ClientHello, ServerHello, SYS_VER, TYPE_CLIENT_HELLO, TYPE_SERVER_HELLO};
use crate::sdk::LoginSdk;
use log::{debug, warn};

impl LoginSdk {
    /// Validate `hello` and answer with a challenge bound to its action.
    ///
    /// Checks run in order and the first failure wins:
    /// 1. version
    /// 2. message type
    /// 3. action
    pub async fn generate_challenge(&self, hello: &ClientHello) -> LoginResult<ServerHello> {
        let action = validate_client_hello(hello).inspect_err(|e| {
            warn!("Rejected client hello: {} ({})", e, e.kind());
        })?;

        let nonce = self
            .nonces
            .mint(action)
            .await
            .map_err(LoginError::NonceMintFailed)?;

        debug!("Issued {} challenge", action);

        Ok(ServerHello {
            ver: SYS_VER.to_string(),
            msg_type: TYPE_SERVER_HELLO.to_string(),
            nonce,
            server: self.config.server_info.clone(),
            chain: self.config.chain.clone(),
            alg: self.config.alg.clone(),
            vc_filters: self.config.filters_for(action).map(<[_]>::to_vec),
        })
    }
}

fn validate_client_hello(hello: &ClientHello) -> LoginResult<Action> {
    if !hello.ver.eq_ignore_ascii_case(SYS_VER) {
        return Err(LoginError::WrongVersion(hello.ver.clone()));
    }
    if !hello.msg_type.eq_ignore_ascii_case(TYPE_CLIENT_HELLO) {
        return Err(LoginError::TypeNotSupported(hello.msg_type.clone()));
    }
    Action::try_from(hello.action).map_err(LoginError::ActionNotSupported)
}
