// src/input/keys.rs

use crate::types::{ClearMode, ReloadKind};

/// ETX, what Ctrl-C produces when the terminal does not turn it into SIGINT.
const CTRL_C: char = '\u{3}';

/// Decoded single-key command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Restart with the given strength, clearing at least `clear` first.
    Reload { kind: ReloadKind, clear: ClearMode },
    Quit,
}

/// Map a keystroke to a command. Unknown keys yield `None`.
///
/// | key         | command                           |
/// |-------------|-----------------------------------|
/// | `r`, space  | partial reload                    |
/// | `R`         | full reload                       |
/// | `c`         | clear screen, partial reload      |
/// | `C`         | clear scrollback, partial reload  |
/// | `q`, Ctrl-C | quit                              |
pub fn decode_key(key: char) -> Option<KeyCommand> {
    let reload = |kind, clear| Some(KeyCommand::Reload { kind, clear });
    match key {
        'r' | ' ' => reload(ReloadKind::Partial, ClearMode::None),
        'R' => reload(ReloadKind::Full, ClearMode::None),
        'c' => reload(ReloadKind::Partial, ClearMode::Screen),
        'C' => reload(ReloadKind::Partial, ClearMode::Scrollback),
        'q' | CTRL_C => Some(KeyCommand::Quit),
        _ => None,
    }
}
