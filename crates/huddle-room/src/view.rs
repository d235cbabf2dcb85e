//! Per-recipient redaction of a round's selections.
//!
//! Each member sees a different `roomSelectionChanged` snapshot. For every
//! member of the room the recipient gets one of:
//!
//! | real selection | room visible, or the member is the recipient | otherwise |
//! |----------------|----------------------------------------------|-----------|
//! | none           | `null`                                       | `null`    |
//! | `"5"`          | `"5"`                                        | `""`      |
//!
//! The empty string means "has picked, not shown yet"; clients rely on it
//! to render face-down cards.
//!
//! Building one view is O(members), so a broadcast after any change is
//! O(members²). Rooms hold tens of people, not thousands.

use huddle_protocol::{ParticipantId, SelectionView};

/// Builds the view of `members` that `recipient` is allowed to see.
///
/// `members` yields every member of the room in display order together
/// with their real selection.
pub fn selection_view<'a, I>(members: I, visible: bool, recipient: &ParticipantId) -> SelectionView
where
    I: IntoIterator<Item = (&'a ParticipantId, Option<&'a str>)>,
{
    members
        .into_iter()
        .map(|(member_id, selection)| {
            let shown = selection.map(|label| {
                if visible || member_id == recipient {
                    label.to_owned()
                } else {
                    String::new()
                }
            });
            (member_id.clone(), shown)
        })
        .collect()
}
