//! Deterministic serialization for state values, actions and receipts.
//!
//! Encoding format:
//! - Fixed-size fields (Hash, u64, u32, u8) are written directly, little-endian
//! - Variable-length fields (Vec<u8>, String) are length-prefixed (u32 LE)
//! - `BigUint` is length-prefixed little-endian magnitude bytes with no high
//!   zero byte (zero is the single byte `0`)
//! - `BigInt` is a sign byte (0 = non-negative, 1 = negative) followed by
//!   its magnitude as a `BigUint`
//!
//! Decoders reject trailing bytes so every value has exactly one encoding.

use num_bigint::{BigInt, BigUint, Sign};

use crate::account::Account;
use crate::action::{Action, ActionBody, Transfer};
use crate::error::ExecError;
use crate::execution::{Receipt, ReceiptStatus};
use crate::types::Hash;

/// Payload tag for transfer actions.
const BODY_TRANSFER: u8 = 0x01;

/// A cursor for reading bytes during decoding.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ExecError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| ExecError::Serialization("unexpected end of data".into()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, ExecError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u32(&mut self) -> Result<u32, ExecError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, ExecError> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    pub fn read_hash(&mut self) -> Result<Hash, ExecError> {
        let bytes = self.read_bytes(32)?;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(bytes);
        Ok(hash)
    }

    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>, ExecError> {
        let len = self.read_u32()? as usize;
        Ok(self.read_bytes(len)?.to_vec())
    }

    pub fn read_string(&mut self) -> Result<String, ExecError> {
        let bytes = self.read_var_bytes()?;
        String::from_utf8(bytes).map_err(|_| ExecError::Serialization("invalid UTF-8".into()))
    }

    pub fn read_biguint(&mut self) -> Result<BigUint, ExecError> {
        let bytes = self.read_var_bytes()?;
        // zero is the single byte [0]; anything else has no high zero byte
        match bytes.as_slice() {
            [] => return Err(ExecError::Serialization("empty integer magnitude".into())),
            [_, .., 0] => {
                return Err(ExecError::Serialization(
                    "non-canonical integer: trailing zero byte".into(),
                ))
            }
            _ => {}
        }
        Ok(BigUint::from_bytes_le(&bytes))
    }

    pub fn read_bigint(&mut self) -> Result<BigInt, ExecError> {
        let sign = match self.read_u8()? {
            0 => Sign::Plus,
            1 => Sign::Minus,
            _ => return Err(ExecError::Serialization("invalid sign byte".into())),
        };
        let magnitude = self.read_biguint()?;
        Ok(BigInt::from_biguint(sign, magnitude))
    }

    /// Fail if any input remains unread.
    pub fn finish(self) -> Result<(), ExecError> {
        if self.pos != self.data.len() {
            return Err(ExecError::Serialization(format!(
                "{} trailing bytes",
                self.data.len() - self.pos
            )));
        }
        Ok(())
    }
}

// ── Encoding helpers ──

pub fn write_u8(buf: &mut Vec<u8>, v: u8) {
    buf.push(v);
}

pub fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

pub fn write_hash(buf: &mut Vec<u8>, h: &Hash) {
    buf.extend_from_slice(h);
}

pub fn write_var_bytes(buf: &mut Vec<u8>, data: &[u8]) {
    write_u32(buf, data.len() as u32);
    buf.extend_from_slice(data);
}

pub fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_var_bytes(buf, s.as_bytes());
}

pub fn write_biguint(buf: &mut Vec<u8>, v: &BigUint) {
    write_var_bytes(buf, &v.to_bytes_le());
}

pub fn write_bigint(buf: &mut Vec<u8>, v: &BigInt) {
    write_u8(buf, if v.sign() == Sign::Minus { 1 } else { 0 });
    write_biguint(buf, v.magnitude());
}

// ── Account ──

/// Encode an `Account` to deterministic bytes.
pub fn encode_account(account: &Account) -> Vec<u8> {
    let mut buf = Vec::with_capacity(48);
    write_biguint(&mut buf, &account.balance);
    write_u64(&mut buf, account.sequence_number);
    write_var_bytes(&mut buf, &account.code_hash);
    buf
}

/// Decode an `Account` from bytes.
pub fn decode_account(data: &[u8]) -> Result<Account, ExecError> {
    let mut r = Reader::new(data);
    let balance = r.read_biguint()?;
    let sequence_number = r.read_u64()?;
    let code_hash = r.read_var_bytes()?;
    r.finish()?;
    Ok(Account {
        balance,
        sequence_number,
        code_hash,
    })
}

// ── Action ──

/// Encode an `Action` to deterministic bytes. The action hash is taken over
/// this encoding.
pub fn encode_action(action: &Action) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    write_u64(&mut buf, action.sequence_number());
    write_u64(&mut buf, action.gas_limit());
    write_bigint(&mut buf, action.gas_price());
    match action.body() {
        ActionBody::Transfer(transfer) => {
            write_u8(&mut buf, BODY_TRANSFER);
            write_bigint(&mut buf, &transfer.amount);
            write_string(&mut buf, &transfer.recipient);
            write_var_bytes(&mut buf, &transfer.payload);
        }
    }
    buf
}

/// Decode an `Action` from bytes.
pub fn decode_action(data: &[u8]) -> Result<Action, ExecError> {
    let mut r = Reader::new(data);
    let sequence_number = r.read_u64()?;
    let gas_limit = r.read_u64()?;
    let gas_price = r.read_bigint()?;
    let body = match r.read_u8()? {
        BODY_TRANSFER => {
            let amount = r.read_bigint()?;
            let recipient = r.read_string()?;
            let payload = r.read_var_bytes()?;
            ActionBody::Transfer(Transfer {
                amount,
                recipient,
                payload,
            })
        }
        other => {
            return Err(ExecError::Serialization(format!(
                "unknown action body: 0x{:02x}",
                other
            )))
        }
    };
    r.finish()?;
    Ok(Action::new(sequence_number, gas_limit, gas_price, body))
}

// ── Receipt ──

/// Encode a `Receipt` to deterministic bytes.
pub fn encode_receipt(receipt: &Receipt) -> Vec<u8> {
    let mut buf = Vec::with_capacity(41);
    write_u8(&mut buf, receipt.status as u8);
    write_u64(&mut buf, receipt.gas_consumed);
    write_hash(&mut buf, &receipt.action_hash);
    buf
}

/// Decode a `Receipt` from bytes.
pub fn decode_receipt(data: &[u8]) -> Result<Receipt, ExecError> {
    let mut r = Reader::new(data);
    let status = ReceiptStatus::from_u8(r.read_u8()?)
        .ok_or_else(|| ExecError::Serialization("invalid receipt status".into()))?;
    let gas_consumed = r.read_u64()?;
    let action_hash = r.read_hash()?;
    r.finish()?;
    Ok(Receipt {
        status,
        gas_consumed,
        action_hash,
    })
}
