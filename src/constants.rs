pub mod token {

    /// Random bytes drawn per token.
    pub const ENTROPY_BYTES: usize = 16;

    /// Unpadded base-32 length of `ENTROPY_BYTES`.
    pub const PLAINTEXT_LEN: usize = 26;
}

pub mod password {

    pub const MIN_BYTES: usize = 8;

    /// Hard ceiling on accepted plaintext input.
    pub const MAX_BYTES: usize = 72;
}

pub mod user {

    pub const MAX_NAME_BYTES: usize = 50;
}

pub mod templates {

    pub const USER_WELCOME: &str = "user_welcome";

    pub const TOKEN_ACTIVATION: &str = "token_activation";

    pub const TOKEN_PASSWORD_RESET: &str = "token_password_reset";
}

pub mod permissions {

    /// Codes seeded into the permission catalogue.
    pub const CATALOGUE: &[&str] = &[
        "movies:read",
        "movies:write",
        "permissions:read",
        "permissions:write",
    ];

    pub const GRANT: &str = "permissions:write";
}
