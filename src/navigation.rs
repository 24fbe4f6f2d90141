// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Article navigation and one-shot status messages

/// Index after `index`, wrapping to the first article
pub fn next_index(index: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (index + 1) % count
    }
}

/// Index before `index`, wrapping to the last article
pub fn prev_index(index: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (index % count + count - 1) % count
    }
}

/// Clamp a requested jump target; the flag is set when it had to move
pub fn clamp_index(index: usize, count: usize) -> (usize, bool) {
    if count == 0 {
        return (0, index != 0);
    }
    if index >= count {
        (count - 1, true)
    } else {
        (index, false)
    }
}

/// Message shown once after a form post redirects back to the article page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flash {
    VerdictSaved,
    VerdictUndone,
    DatesSaved,
    StartCleared,
    EndCleared,
    NotesSaved,
    SaveNeedsVerdict,
    ClearStartNeedsRecord,
    ClearEndNeedsRecord,
    InvalidDate,
    JumpClamped,
}

impl Flash {
    const ALL: [Flash; 11] = [
        Flash::VerdictSaved,
        Flash::VerdictUndone,
        Flash::DatesSaved,
        Flash::StartCleared,
        Flash::EndCleared,
        Flash::NotesSaved,
        Flash::SaveNeedsVerdict,
        Flash::ClearStartNeedsRecord,
        Flash::ClearEndNeedsRecord,
        Flash::InvalidDate,
        Flash::JumpClamped,
    ];

    /// Query parameter value
    pub fn as_param(&self) -> &'static str {
        match self {
            Flash::VerdictSaved => "verdict-saved",
            Flash::VerdictUndone => "verdict-undone",
            Flash::DatesSaved => "dates-saved",
            Flash::StartCleared => "start-cleared",
            Flash::EndCleared => "end-cleared",
            Flash::NotesSaved => "notes-saved",
            Flash::SaveNeedsVerdict => "save-needs-verdict",
            Flash::ClearStartNeedsRecord => "clear-start-needs-record",
            Flash::ClearEndNeedsRecord => "clear-end-needs-record",
            Flash::InvalidDate => "invalid-date",
            Flash::JumpClamped => "jump-clamped",
        }
    }

    pub fn from_param(param: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_param() == param)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Flash::VerdictSaved => "Saved visibility verdict.",
            Flash::VerdictUndone => "Cleared visibility verdict.",
            Flash::DatesSaved => "Submitted corrected dates.",
            Flash::StartCleared => "Cleared corrected start date.",
            Flash::EndCleared => "Cleared corrected end date.",
            Flash::NotesSaved => "Submitted notes.",
            Flash::SaveNeedsVerdict => "Cannot save - select Yes/Unsure/No first.",
            Flash::ClearStartNeedsRecord => {
                "Cannot clear start date yet - select Yes/Unsure/No or add a note first."
            }
            Flash::ClearEndNeedsRecord => {
                "Cannot clear end date yet - select Yes/Unsure/No or add a note first."
            }
            Flash::InvalidDate => "Dates must be in YYYY-MM-DD format.",
            Flash::JumpClamped => "Article index out of range, showing the last article.",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Flash::SaveNeedsVerdict
                | Flash::ClearStartNeedsRecord
                | Flash::ClearEndNeedsRecord
                | Flash::InvalidDate
                | Flash::JumpClamped
        )
    }
}

/// Location of the review page for `index`, optionally carrying a flash
pub fn article_location(index: usize, flash: Option<Flash>) -> String {
    match flash {
        Some(flash) => format!("/article/{}?flash={}", index, flash.as_param()),
        None => format!("/article/{}", index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_wraps() {
        assert_eq!(next_index(0, 3), 1);
        assert_eq!(next_index(2, 3), 0);
        assert_eq!(prev_index(0, 3), 2);
        assert_eq!(prev_index(2, 3), 1);
        assert_eq!(next_index(0, 1), 0);
        assert_eq!(prev_index(0, 1), 0);
        assert_eq!(prev_index(0, 0), 0);
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(2, 5), (2, false));
        assert_eq!(clamp_index(5, 5), (4, true));
        assert_eq!(clamp_index(99, 5), (4, true));
        assert_eq!(clamp_index(0, 0), (0, false));
    }

    #[test]
    fn test_flash_params_round_trip() {
        for flash in Flash::ALL {
            assert_eq!(Flash::from_param(flash.as_param()), Some(flash));
        }
        assert_eq!(Flash::from_param("bogus"), None);
    }

    #[test]
    fn test_article_location() {
        assert_eq!(article_location(3, None), "/article/3");
        assert_eq!(article_location(0, Some(Flash::NotesSaved)), "/article/0?flash=notes-saved");
    }
}
