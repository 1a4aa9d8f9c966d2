//! Minimal ABI surface of the two contracts the app talks to: an ERC20 token
//! and the multisender.

use ethers::abi::{Function, Param, ParamType, StateMutability, Token};
use ethers::types::{Address, Bytes, U256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("ABI encoding failed: {0}")]
    Abi(#[from] ethers::abi::Error),
    #[error("Unexpected return data from {0}()")]
    UnexpectedOutput(&'static str),
}

fn param(name: &str, kind: ParamType) -> Param {
    Param {
        name: name.to_string(),
        kind,
        internal_type: None,
    }
}

#[allow(deprecated)]
fn function(
    name: &str,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
    state_mutability: StateMutability,
) -> Function {
    Function {
        name: name.to_string(),
        inputs,
        outputs,
        constant: None,
        state_mutability,
    }
}

/// function decimals() view returns (uint8)
pub fn decimals_function() -> Function {
    function(
        "decimals",
        vec![],
        vec![param("", ParamType::Uint(8))],
        StateMutability::View,
    )
}

/// function symbol() view returns (string)
pub fn symbol_function() -> Function {
    function(
        "symbol",
        vec![],
        vec![param("", ParamType::String)],
        StateMutability::View,
    )
}

/// function allowance(address owner, address spender) view returns (uint256)
pub fn allowance_function() -> Function {
    function(
        "allowance",
        vec![
            param("owner", ParamType::Address),
            param("spender", ParamType::Address),
        ],
        vec![param("", ParamType::Uint(256))],
        StateMutability::View,
    )
}

/// function approve(address spender, uint256 amount) returns (bool)
pub fn approve_function() -> Function {
    function(
        "approve",
        vec![
            param("spender", ParamType::Address),
            param("amount", ParamType::Uint(256)),
        ],
        vec![param("", ParamType::Bool)],
        StateMutability::NonPayable,
    )
}

/// function disperseToken(address tokenAddress, address[] recipients, uint256[] amounts)
pub fn disperse_token_function() -> Function {
    function(
        "disperseToken",
        vec![
            param("tokenAddress", ParamType::Address),
            param("recipients", ParamType::Array(Box::new(ParamType::Address))),
            param("amounts", ParamType::Array(Box::new(ParamType::Uint(256)))),
        ],
        vec![],
        StateMutability::NonPayable,
    )
}

pub fn encode_decimals() -> Result<Bytes, AbiError> {
    Ok(decimals_function().encode_input(&[])?.into())
}

pub fn encode_symbol() -> Result<Bytes, AbiError> {
    Ok(symbol_function().encode_input(&[])?.into())
}

pub fn encode_allowance(owner: Address, spender: Address) -> Result<Bytes, AbiError> {
    let data = allowance_function()
        .encode_input(&[Token::Address(owner), Token::Address(spender)])?;
    Ok(data.into())
}

pub fn encode_approve(spender: Address, amount: U256) -> Result<Bytes, AbiError> {
    let data = approve_function().encode_input(&[Token::Address(spender), Token::Uint(amount)])?;
    Ok(data.into())
}

pub fn encode_disperse_token(
    token: Address,
    recipients: &[Address],
    amounts: &[U256],
) -> Result<Bytes, AbiError> {
    let recipient_tokens: Vec<Token> = recipients.iter().map(|a| Token::Address(*a)).collect();
    let amount_tokens: Vec<Token> = amounts.iter().map(|a| Token::Uint(*a)).collect();
    let data = disperse_token_function().encode_input(&[
        Token::Address(token),
        Token::Array(recipient_tokens),
        Token::Array(amount_tokens),
    ])?;
    Ok(data.into())
}

fn single_uint(function: &Function, name: &'static str, output: &[u8]) -> Result<U256, AbiError> {
    match function.decode_output(output)?.as_slice() {
        [Token::Uint(value)] => Ok(*value),
        _ => Err(AbiError::UnexpectedOutput(name)),
    }
}

pub fn decode_decimals(output: &[u8]) -> Result<u8, AbiError> {
    let value = single_uint(&decimals_function(), "decimals", output)?;
    if value > U256::from(u8::MAX) {
        return Err(AbiError::UnexpectedOutput("decimals"));
    }
    Ok(value.low_u32() as u8)
}

/// Decode `symbol()`. Older tokens return `bytes32` instead of `string`; those
/// are accepted too.
pub fn decode_symbol(output: &[u8]) -> Result<String, AbiError> {
    if let Ok(tokens) = symbol_function().decode_output(output) {
        if let [Token::String(symbol)] = tokens.as_slice() {
            return Ok(symbol.clone());
        }
    }

    if output.len() == 32 {
        let end = output.iter().position(|b| *b == 0).unwrap_or(32);
        if let Ok(symbol) = std::str::from_utf8(&output[..end]) {
            return Ok(symbol.to_string());
        }
    }
    Err(AbiError::UnexpectedOutput("symbol"))
}

pub fn decode_allowance(output: &[u8]) -> Result<U256, AbiError> {
    single_uint(&allowance_function(), "allowance", output)
}
