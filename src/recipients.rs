//! Parsing of the recipient batch text.
//!
//! One `address,amount` pair per line, no header row, blank lines ignored.
//! Amounts are kept as decimal strings until the token's decimals are known.

use ethers::types::Address;
use ethers::utils::to_checksum;
use thiserror::Error;

/// Sample batch offered by the "Fill example" action.
pub const EXAMPLE_RECIPIENTS: &str =
    "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B,10\n0xDc25EF3f5b8a186998338a2adA83795f52EAF183,2.5";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recipients list is empty.")]
    EmptyRecipients,
    #[error("Invalid format on line: \"{0}\"")]
    MalformedLine(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Please enter valid contract addresses (got \"{0}\").")]
    InvalidContractAddress(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientEntry {
    pub address: Address,
    pub amount: String,
}

/// Ordered list of recipients. Order matches the on-chain argument order and
/// duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientBatch {
    entries: Vec<RecipientEntry>,
}

impl RecipientBatch {
    pub fn entries(&self) -> &[RecipientEntry] {
        &self.entries
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.entries.iter().map(|e| e.address).collect()
    }

    pub fn amounts(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.amount.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validate a 20-byte hex address, with or without the `0x` prefix.
///
/// All-lowercase and all-uppercase forms are accepted as-is; mixed case must
/// match the EIP-55 checksum.
pub fn parse_address(value: &str) -> Option<Address> {
    let hex = value.strip_prefix("0x").unwrap_or(value);
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let address: Address = format!("0x{}", hex).parse().ok()?;
    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && to_checksum(&address, None)[2..] != *hex {
        return None;
    }
    Some(address)
}

/// Validate one of the contract address fields of the form.
pub fn parse_contract_address(value: &str) -> Result<Address, ValidationError> {
    let trimmed = value.trim();
    parse_address(trimmed).ok_or_else(|| ValidationError::InvalidContractAddress(trimmed.to_string()))
}

/// Plain positive decimal: digits with an optional fractional part, no sign or exponent.
fn is_positive_decimal(value: &str) -> bool {
    let (whole, fraction) = match value.split_once('.') {
        Some((whole, fraction)) if !fraction.is_empty() => (whole, fraction),
        Some(_) => return false,
        None => (value, ""),
    };
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if whole.is_empty() && fraction.is_empty() {
        return false;
    }
    all_digits(whole) && all_digits(fraction) && value.chars().any(|c| matches!(c, '1'..='9'))
}

pub fn parse_recipients(raw: &str) -> Result<RecipientBatch, ValidationError> {
    let data = raw.trim();
    if data.is_empty() {
        return Err(ValidationError::EmptyRecipients);
    }

    let mut entries = Vec::new();
    for line in data.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        let [address, amount] = parts.as_slice() else {
            return Err(ValidationError::MalformedLine(line.trim().to_string()));
        };

        let address = parse_address(address)
            .ok_or_else(|| ValidationError::InvalidAddress(address.to_string()))?;
        if !is_positive_decimal(amount) {
            return Err(ValidationError::InvalidAmount(amount.to_string()));
        }

        entries.push(RecipientEntry {
            address,
            amount: amount.to_string(),
        });
    }

    Ok(RecipientBatch { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR_A: &str = "0xAb5801a7D398351b8bE11C439e05C5B3259aeC9B";
    const ADDR_B: &str = "0xDc25EF3f5b8a186998338a2adA83795f52EAF183";

    #[test]
    fn test_parse_preserves_order() {
        let batch = parse_recipients(&format!("{},1\n{},2", ADDR_B, ADDR_A)).unwrap();
        assert_eq!(
            batch.addresses(),
            vec![ADDR_B.parse::<Address>().unwrap(), ADDR_A.parse::<Address>().unwrap()]
        );
        assert_eq!(batch.amounts(), vec!["1", "2"]);
    }

    #[test]
    fn test_parse_example_batch() {
        let batch = parse_recipients(EXAMPLE_RECIPIENTS).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.amounts(), vec!["10", "2.5"]);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_trims() {
        let input = format!("\n  {} ,  10 \n\n   \n{},2.5\n", ADDR_A, ADDR_B);
        let batch = parse_recipients(&input).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.amounts(), vec!["10", "2.5"]);
    }

    #[test]
    fn test_parse_keeps_duplicates() {
        let input = format!("{},1\n{},1", ADDR_A, ADDR_A);
        let batch = parse_recipients(&input).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.entries()[0], batch.entries()[1]);
    }

    #[test]
    fn test_parse_handles_crlf() {
        let input = format!("{},1\r\n{},2\r\n", ADDR_A, ADDR_B);
        assert_eq!(parse_recipients(&input).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_empty_fails() {
        assert_eq!(parse_recipients(""), Err(ValidationError::EmptyRecipients));
        assert_eq!(parse_recipients("  \n \n"), Err(ValidationError::EmptyRecipients));
    }

    #[test]
    fn test_parse_invalid_address() {
        assert_eq!(
            parse_recipients("0xBAD,1"),
            Err(ValidationError::InvalidAddress("0xBAD".to_string()))
        );
    }

    #[test]
    fn test_parse_bad_checksum_is_rejected() {
        // Same address as ADDR_B with the wrong capitalisation
        let input = "0xdC25EF3F5B8a186998338A2ADA83795F52eAF183,1";
        assert!(matches!(
            parse_recipients(input),
            Err(ValidationError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_lowercase_address_accepted() {
        let input = format!("{},1", ADDR_B.to_lowercase());
        assert!(parse_recipients(&input).is_ok());
    }

    #[test]
    fn test_parse_negative_amount() {
        assert_eq!(
            parse_recipients(&format!("{},-1", ADDR_A)),
            Err(ValidationError::InvalidAmount("-1".to_string()))
        );
    }

    #[test]
    fn test_parse_zero_amount() {
        assert_eq!(
            parse_recipients(&format!("{},0", ADDR_A)),
            Err(ValidationError::InvalidAmount("0".to_string()))
        );
        assert_eq!(
            parse_recipients(&format!("{},0.000", ADDR_A)),
            Err(ValidationError::InvalidAmount("0.000".to_string()))
        );
    }

    #[test]
    fn test_parse_non_numeric_amounts() {
        for amount in ["abc", "1e18", "10abc", "1.", ".", "", "NaN", "inf", "1.2.3"] {
            let input = format!("{},{}", ADDR_A, amount);
            assert!(
                matches!(parse_recipients(&input), Err(ValidationError::InvalidAmount(_))),
                "amount {:?} should be rejected",
                amount
            );
        }
    }

    #[test]
    fn test_parse_leading_dot_amount() {
        let batch = parse_recipients(&format!("{},.5", ADDR_A)).unwrap();
        assert_eq!(batch.amounts(), vec![".5"]);
    }

    #[test]
    fn test_parse_malformed_lines() {
        assert_eq!(
            parse_recipients(ADDR_A),
            Err(ValidationError::MalformedLine(ADDR_A.to_string()))
        );
        let three = format!("{},1,2", ADDR_A);
        assert_eq!(
            parse_recipients(&three),
            Err(ValidationError::MalformedLine(three.clone()))
        );
    }

    #[test]
    fn test_parse_error_on_later_line() {
        let input = format!("{},1\n{},zero", ADDR_A, ADDR_B);
        assert_eq!(
            parse_recipients(&input),
            Err(ValidationError::InvalidAmount("zero".to_string()))
        );
    }

    #[test]
    fn test_parse_address_prefix_is_optional() {
        let expected: Address = ADDR_A.parse().unwrap();
        assert_eq!(parse_address(&ADDR_A[2..]), Some(expected));
        assert_eq!(parse_address(ADDR_A), Some(expected));
        assert!(parse_address("0x1234").is_none());
        assert!(parse_address("0X").is_none());
    }

    #[test]
    fn test_parse_unprefixed_recipient_is_normalized() {
        let input = format!("{},1", &ADDR_A[2..]);
        let batch = parse_recipients(&input).unwrap();
        assert_eq!(batch.addresses(), vec![ADDR_A.parse::<Address>().unwrap()]);
    }

    #[test]
    fn test_parse_unprefixed_bad_checksum_is_rejected() {
        // original example address, checksum broken
        assert!(parse_address("dC25EF3F5B8a186998338A2ADA83795F52eAF183").is_none());
    }

    #[test]
    fn test_parse_contract_address() {
        assert!(parse_contract_address(&format!("  {}  ", ADDR_A)).is_ok());
        assert_eq!(
            parse_contract_address("token"),
            Err(ValidationError::InvalidContractAddress("token".to_string()))
        );
    }
}
