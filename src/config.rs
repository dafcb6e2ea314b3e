use crate::constants::DEFAULT_MAX_NAMES;

/// Knobs for the meta-codec selector (§4.D).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetaCodecConfig {
  /// Whether X4 (4-way byte interleave) may be tried. The recursive calls
  /// X4 makes on each quarter always construct a config with this forced
  /// to `false`, so X4 never nests (§4.D, §9).
  pub allow_x4: bool,
}

impl Default for MetaCodecConfig {
  fn default() -> Self {
    MetaCodecConfig { allow_x4: true }
  }
}

impl MetaCodecConfig {
  pub(crate) fn without_x4(self) -> Self {
    MetaCodecConfig { allow_x4: false }
  }
}

/// Knobs for the name tokeniser (§5).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenizerConfig {
  /// Upper bound on the number of lines cached per block, and the cap
  /// applied to DUP/DIFF parent distances (§9 "Unresolved in the source").
  pub max_names: usize,
}

impl Default for TokenizerConfig {
  fn default() -> Self {
    TokenizerConfig {
      max_names: DEFAULT_MAX_NAMES,
    }
  }
}
