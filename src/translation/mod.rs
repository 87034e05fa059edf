/*!
 * MJML translation pipeline.
 *
 * - `shield`: placeholder shielding of tags, comments, templating and tokens
 * - `locks`: splitting a document on `notranslate` lock markers
 * - `markup`: locating translatable MJML bodies and attributes
 * - `samples`: before/after previews for reports
 * - `orchestrator`: the lock-aware document translator
 */

pub use self::locks::{LockSplit, Segment};
pub use self::orchestrator::{DocumentOutcome, MarkupTranslator};
pub use self::samples::ChangeSample;
pub use self::shield::{ShieldMap, ShieldProfile, Shielded};

pub mod locks;
pub mod markup;
pub mod orchestrator;
pub mod samples;
pub mod shield;
