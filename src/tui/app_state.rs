#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum AppMode {
    Normal,
    Filtering,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub(super) enum NoticeKind {
    Info,
    Error,
}

/// One line of feedback shown under the list until the next action.
#[derive(PartialEq, Eq, Debug, Clone)]
pub(super) struct Notice {
    pub(super) kind: NoticeKind,
    pub(super) text: String,
}

/// What the run loop should do with the browser after a key press.
#[derive(PartialEq, Eq, Debug, Clone)]
pub(super) enum Action {
    OpenDirectory(String),
    GoUp,
    SelectFile(String),
    TogglePick(String),
    Retry(String),
    CycleFormat,
}
