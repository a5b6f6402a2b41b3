use std::fmt::Display;

/// The clause the interpreter is currently reading.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ClauseContext {
    #[default]
    None,
    Select,
    From,
    Join,
    With,
    On,
}

impl Display for ClauseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ClauseContext::None => "none",
            ClauseContext::Select => "select",
            ClauseContext::From => "from",
            ClauseContext::Join => "join",
            ClauseContext::With => "with",
            ClauseContext::On => "on",
        };
        f.write_str(text)
    }
}
