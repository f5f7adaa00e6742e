use super::PatchOperation;
use crate::errors::EngineError;

/// Apply disjoint operations to a copy of `content`.
///
/// Every write is bounds-checked before anything is copied; an operation
/// reaching past the end fails the whole call with
/// [`EngineError::OutOfRange`].
pub fn apply(content: &[u8], operations: &[PatchOperation]) -> Result<Vec<u8>, EngineError> {
    let mut spans = Vec::with_capacity(operations.len());
    for op in operations {
        let out_of_range = || EngineError::OutOfRange {
            offset: op.offset,
            len: op.bytes.len(),
            content_len: content.len(),
        };
        let start = usize::try_from(op.offset).map_err(|_| out_of_range())?;
        let end = start
            .checked_add(op.bytes.len())
            .filter(|&end| end <= content.len())
            .ok_or_else(out_of_range)?;
        spans.push((start, end));
    }

    let mut patched = content.to_vec();
    for (op, (start, end)) in operations.iter().zip(spans) {
        patched[start..end].copy_from_slice(&op.bytes);
    }
    log::debug!("applied {} patch operation(s)", operations.len());
    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(offset: u64, bytes: &[u8]) -> PatchOperation {
        PatchOperation {
            offset,
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn test_apply_writes_at_offsets() {
        let content = vec![0u8; 8];
        let patched = apply(&content, &[op(1, &[0xAA, 0xBB]), op(6, &[0xCC, 0xDD])]).unwrap();
        assert_eq!(patched, vec![0, 0xAA, 0xBB, 0, 0, 0, 0xCC, 0xDD]);
        assert_eq!(content, vec![0u8; 8]);
    }

    #[test]
    fn test_apply_rejects_out_of_range() {
        let content = vec![0u8; 4];
        let err = apply(&content, &[op(0, &[1]), op(3, &[1, 2])]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::OutOfRange {
                offset: 3,
                len: 2,
                content_len: 4
            }
        ));
    }

    #[test]
    fn test_apply_rejects_huge_offset() {
        let err = apply(&[0u8; 4], &[op(u64::MAX, &[1])]).unwrap_err();
        assert!(matches!(err, EngineError::OutOfRange { .. }));
    }

    #[test]
    fn test_apply_nothing() {
        assert_eq!(apply(b"abc", &[]).unwrap(), b"abc".to_vec());
    }
}
