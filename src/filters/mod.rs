/// Filter/zoom state: what the user selected, and how year input is checked.
///
/// ```text
///  keystroke ─▶ debounce ──(immediate value)──▶ controller ─▶ DataQuery
///                  │                                ▲
///                  └──(after pause)─▶ validation    │
///                                                   zoom (Apply / Reset)
/// ```

pub mod controller;
pub mod debounce;
pub mod validation;
pub mod zoom;
