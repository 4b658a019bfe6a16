//! 配置校验模块
//!
//! 校验规则：
//! - batch_size > 0
//! - scheme 非空且只含合法字符
//! - builder 必填字段非空
//! - file client 的 base_path 非空

use contracts::{BuilderConfig, ClientConfig, ContractError, PutBlueprint};

/// 校验 PutBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &PutBlueprint) -> Result<(), ContractError> {
    validate_dispatcher(blueprint)?;
    validate_builder(&blueprint.builder)?;
    validate_client(&blueprint.client)?;
    Ok(())
}

/// 校验 dispatcher 设置
fn validate_dispatcher(blueprint: &PutBlueprint) -> Result<(), ContractError> {
    let settings = &blueprint.dispatcher;

    if settings.batch_size == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.batch_size",
            "batch_size must be > 0",
        ));
    }

    if settings.scheme.is_empty() {
        return Err(ContractError::config_validation(
            "dispatcher.scheme",
            "scheme cannot be empty",
        ));
    }

    let valid_chars = settings
        .scheme
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_chars {
        return Err(ContractError::config_validation(
            "dispatcher.scheme",
            format!("invalid scheme '{}'", settings.scheme),
        ));
    }

    Ok(())
}

/// 校验 builder 配置
fn validate_builder(builder: &BuilderConfig) -> Result<(), ContractError> {
    require_non_blank("builder.destination", builder.destination())?;

    match builder {
        BuilderConfig::Cell(cfg) => {
            require_non_blank("builder.key", &cfg.key)?;
            require_non_blank("builder.family", &cfg.family)?;
            require_non_blank("builder.qualifier", &cfg.qualifier)?;
        }
        BuilderConfig::Json(cfg) => {
            require_non_blank("builder.family", &cfg.family)?;
            let has_key_field = cfg.key_field.as_deref().is_some_and(|f| !f.trim().is_empty());
            let has_key = cfg.key.as_deref().is_some_and(|k| !k.trim().is_empty());
            if !has_key_field && !has_key {
                return Err(ContractError::config_validation(
                    "builder.key_field / builder.key",
                    "json builder requires either key_field or key",
                ));
            }
        }
    }

    Ok(())
}

/// 校验 client 配置
fn validate_client(client: &ClientConfig) -> Result<(), ContractError> {
    if let ClientConfig::File { base_path } = client {
        require_non_blank("client.base_path", base_path)?;
    }
    Ok(())
}

fn require_non_blank(field: &str, value: &str) -> Result<(), ContractError> {
    if value.trim().is_empty() {
        return Err(ContractError::config_validation(
            field,
            format!("{field} cannot be empty"),
        ));
    }
    Ok(())
}
