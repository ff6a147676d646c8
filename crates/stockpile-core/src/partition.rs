use crate::CoreError;
use stockpile_schema::SubFileDeclaration;

/// Check that every declared range is well-formed and that no two overlap.
///
/// Ranges are inclusive, so `[1, 10]` and `[10, 20]` overlap. Declarations are
/// sorted stably by `start` before the adjacent-pair scan, which keeps the
/// reported pair deterministic for equal starts.
pub fn check_ranges(declarations: &[SubFileDeclaration]) -> Result<(), CoreError> {
    if declarations.is_empty() {
        return Ok(());
    }

    for (index, decl) in declarations.iter().enumerate() {
        if decl.start > decl.end {
            return Err(CoreError::MalformedRange {
                index,
                declaration: decl.to_string(),
            });
        }
    }

    let mut sorted: Vec<&SubFileDeclaration> = declarations.iter().collect();
    sorted.sort_by_key(|d| d.start);

    for pair in sorted.windows(2) {
        let (current, next) = (pair[0], pair[1]);
        if current.end >= next.start {
            return Err(CoreError::OverlappingRanges {
                first: current.to_string(),
                second: next.to_string(),
            });
        }
    }
    Ok(())
}
