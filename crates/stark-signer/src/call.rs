use serde::{Deserialize, Serialize};

use crate::error::SignerError;
use crate::felt::Felt;
use crate::selector::selector_from_name;

/// A single contract invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Destination contract address.
    pub to: Felt,
    /// Entry-point selector.
    pub selector: Felt,
    /// Ordered call arguments.
    pub calldata: Vec<Felt>,
}

impl Call {
    /// Builds a call to the method `method` of contract `to`.
    pub fn new(to: Felt, method: &str, calldata: Vec<Felt>) -> Result<Self, SignerError> {
        Ok(Self {
            to,
            selector: selector_from_name(method)?,
            calldata,
        })
    }

    /// Builds a call from an already resolved selector.
    pub fn with_selector(to: Felt, selector: Felt, calldata: Vec<Felt>) -> Self {
        Self {
            to,
            selector,
            calldata,
        }
    }
}

/// Flattened descriptor of one call inside a multicall.
///
/// `data_offset` and `data_len` index into the shared calldata array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallArrayEntry {
    pub to: Felt,
    pub selector: Felt,
    pub data_offset: usize,
    pub data_len: usize,
}

impl CallArrayEntry {
    /// The entry as the four felts `[to, selector, data_offset, data_len]`.
    pub fn to_felts(&self) -> [Felt; 4] {
        [
            self.to,
            self.selector,
            Felt::from(self.data_offset),
            Felt::from(self.data_len),
        ]
    }
}

/// Splits calls into a call array and one concatenated calldata array.
pub fn flatten_calls(calls: &[Call]) -> (Vec<CallArrayEntry>, Vec<Felt>) {
    let mut call_array = Vec::with_capacity(calls.len());
    let mut calldata = Vec::with_capacity(calls.iter().map(|c| c.calldata.len()).sum());

    for call in calls {
        call_array.push(CallArrayEntry {
            to: call.to,
            selector: call.selector,
            data_offset: calldata.len(),
            data_len: call.calldata.len(),
        });
        calldata.extend_from_slice(&call.calldata);
    }

    (call_array, calldata)
}

/// Rebuilds the individual calls described by a call array.
///
/// Fails when an entry points outside the calldata array.
pub fn unflatten_calls(
    call_array: &[CallArrayEntry],
    calldata: &[Felt],
) -> Result<Vec<Call>, SignerError> {
    call_array
        .iter()
        .map(|entry| {
            let end = entry
                .data_offset
                .checked_add(entry.data_len)
                .filter(|&end| end <= calldata.len())
                .ok_or_else(|| {
                    SignerError::InvalidFelt(format!(
                        "call array entry [{}..+{}] exceeds calldata length {}",
                        entry.data_offset,
                        entry.data_len,
                        calldata.len()
                    ))
                })?;

            Ok(Call::with_selector(
                entry.to,
                entry.selector,
                calldata[entry.data_offset..end].to_vec(),
            ))
        })
        .collect()
}

/// The `__execute__` argument list:
/// `[call_array_len, ...call_array, calldata_len, ...calldata, nonce]`.
pub fn execute_calldata(call_array: &[CallArrayEntry], calldata: &[Felt], nonce: &Felt) -> Vec<Felt> {
    let mut out = Vec::with_capacity(3 + call_array.len() * 4 + calldata.len());

    out.push(Felt::from(call_array.len()));
    for entry in call_array {
        out.extend_from_slice(&entry.to_felts());
    }
    out.push(Felt::from(calldata.len()));
    out.extend_from_slice(calldata);
    out.push(*nonce);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(value: u64) -> Felt {
        Felt::from(value)
    }

    fn sample_calls() -> Vec<Call> {
        vec![
            Call::new(n(0x111), "transfer_ownership", vec![n(123)]).unwrap(),
            Call::new(n(0x222), "approve", vec![n(1), n(2), n(3)]).unwrap(),
            Call::new(n(0x333), "get_owner", vec![]).unwrap(),
        ]
    }

    #[test]
    fn call_new_resolves_selector() {
        let call = Call::new(n(1), "transfer_ownership", vec![]).unwrap();
        assert_eq!(call.selector, selector_from_name("transfer_ownership").unwrap());
        assert!(Call::new(n(1), "naïve", vec![]).is_err());
    }

    #[test]
    fn flatten_records_offsets_and_lengths() {
        let (call_array, calldata) = flatten_calls(&sample_calls());

        assert_eq!(call_array.len(), 3);
        assert_eq!((call_array[0].data_offset, call_array[0].data_len), (0, 1));
        assert_eq!((call_array[1].data_offset, call_array[1].data_len), (1, 3));
        assert_eq!((call_array[2].data_offset, call_array[2].data_len), (4, 0));
        assert_eq!(calldata, vec![n(123), n(1), n(2), n(3)]);
    }

    #[test]
    fn flatten_then_unflatten_restores_calls() {
        let calls = sample_calls();
        let (call_array, calldata) = flatten_calls(&calls);
        assert_eq!(unflatten_calls(&call_array, &calldata).unwrap(), calls);
    }

    #[test]
    fn unflatten_rejects_out_of_bounds_entry() {
        let entry = CallArrayEntry {
            to: n(1),
            selector: n(2),
            data_offset: 2,
            data_len: 5,
        };
        assert!(unflatten_calls(&[entry], &[n(1), n(2), n(3)]).is_err());

        let overflowing = CallArrayEntry {
            data_offset: usize::MAX,
            data_len: 1,
            ..entry
        };
        assert!(unflatten_calls(&[overflowing], &[]).is_err());
    }

    #[test]
    fn execute_calldata_layout() {
        let calls = vec![Call::with_selector(n(0x123), n(0xabc), vec![n(123)])];
        let (call_array, calldata) = flatten_calls(&calls);

        assert_eq!(
            execute_calldata(&call_array, &calldata, &n(9)),
            vec![n(1), n(0x123), n(0xabc), n(0), n(1), n(1), n(123), n(9)]
        );
    }

    #[test]
    fn entry_serializes_to_json() {
        let entry = CallArrayEntry {
            to: n(1),
            selector: n(2),
            data_offset: 0,
            data_len: 1,
        };
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json["data_len"], 1);
        assert_eq!(json["to"], "1");
    }
}
