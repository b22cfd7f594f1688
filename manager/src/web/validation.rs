//! Input checks for zone, watcher and DNS record requests.

use crate::constants::dns;
use crate::errors::ValidationError;
use crate::provider::DnsRecordInput;

/// Provider zone ids are 32 lowercase hex characters
pub fn validate_zone_id(zone_id: &str) -> Result<(), ValidationError> {
    if zone_id.is_empty() {
        return Err(ValidationError::missing("zoneId"));
    }
    let is_hex = zone_id
        .chars()
        .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if zone_id.len() != 32 || !is_hex {
        return Err(ValidationError::invalid(
            "zoneId",
            "must be 32 lowercase hexadecimal characters",
        ));
    }
    Ok(())
}

/// Dotted DNS name: labels of 1-63 alphanumerics or inner hyphens
pub fn validate_zone_name(field: &str, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::missing(field));
    }
    if name.len() > dns::MAX_ZONE_NAME_LEN {
        return Err(ValidationError::invalid(
            field,
            format!("must be at most {} characters", dns::MAX_ZONE_NAME_LEN),
        ));
    }

    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() < 2 {
        return Err(ValidationError::invalid(field, "must be a domain name"));
    }
    for label in labels {
        let valid = !label.is_empty()
            && label.len() <= 63
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-');
        if !valid {
            return Err(ValidationError::invalid(
                field,
                format!("invalid label '{}'", label),
            ));
        }
    }
    Ok(())
}

pub fn validate_record_name(field: &str, name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::missing(field));
    }
    if name.len() > dns::MAX_NAME_LEN {
        return Err(ValidationError::invalid(
            field,
            format!("must be at most {} characters", dns::MAX_NAME_LEN),
        ));
    }
    Ok(())
}

pub fn validate_ttl(ttl: u32) -> Result<(), ValidationError> {
    if ttl == dns::TTL_AUTO || (dns::TTL_MIN..=dns::TTL_MAX).contains(&ttl) {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            "ttl",
            format!(
                "must be {} (automatic) or between {} and {}",
                dns::TTL_AUTO,
                dns::TTL_MIN,
                dns::TTL_MAX
            ),
        ))
    }
}

pub fn validate_record_input(input: &DnsRecordInput) -> Result<(), ValidationError> {
    if !dns::RECORD_TYPES.contains(&input.record_type.as_str()) {
        return Err(ValidationError::invalid(
            "type",
            format!("must be one of {}", dns::RECORD_TYPES.join(", ")),
        ));
    }
    validate_record_name("name", &input.name)?;

    if input.content.trim().is_empty() {
        return Err(ValidationError::missing("content"));
    }
    if input.content.len() > dns::MAX_CONTENT_LEN {
        return Err(ValidationError::invalid(
            "content",
            format!("must be at most {} characters", dns::MAX_CONTENT_LEN),
        ));
    }

    validate_ttl(input.ttl)
}
