use crate::CoreError;
use std::fmt;

/// Stages of one verification run, in the only order they may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStage {
    ParseRoot,
    NormalizeDsn,
    ValidateAssets,
    PartitionSubFiles,
    LoadSubFiles,
    Compose,
}

impl VerifyStage {
    fn ordinal(self) -> u8 {
        match self {
            VerifyStage::ParseRoot => 0,
            VerifyStage::NormalizeDsn => 1,
            VerifyStage::ValidateAssets => 2,
            VerifyStage::PartitionSubFiles => 3,
            VerifyStage::LoadSubFiles => 4,
            VerifyStage::Compose => 5,
        }
    }
}

impl fmt::Display for VerifyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerifyStage::ParseRoot => "parse-root",
            VerifyStage::NormalizeDsn => "normalize-dsn",
            VerifyStage::ValidateAssets => "validate-assets",
            VerifyStage::PartitionSubFiles => "partition-sub-files",
            VerifyStage::LoadSubFiles => "load-sub-files",
            VerifyStage::Compose => "compose",
        };
        f.write_str(name)
    }
}

pub fn validate_transition(from: VerifyStage, to: VerifyStage) -> Result<(), CoreError> {
    if to.ordinal() == from.ordinal() + 1 {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

pub(crate) fn advance(stage: &mut VerifyStage, to: VerifyStage) -> Result<(), CoreError> {
    validate_transition(*stage, to)?;
    tracing::debug!("stage {stage} -> {to}");
    *stage = to;
    Ok(())
}
