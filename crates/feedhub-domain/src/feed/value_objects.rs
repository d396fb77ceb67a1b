use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::shared::DomainError;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(DomainError::InvalidInput(format!(
                        "'{}' is not a valid {}",
                        s,
                        stringify!($name)
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }
    };
}

string_enum!(
    /// Product tenant axis. Partitions all data.
    Flavour {
        Consumer => "CONSUMER",
        Pro => "PRO",
    }
);

string_enum!(
    Status {
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Done => "DONE",
    }
);

string_enum!(
    Visibility {
        Show => "SHOW",
        Hide => "HIDE",
    }
);

string_enum!(
    /// Where an action is rendered. `Floating` is only allowed in the
    /// feed-level action list.
    ActionType {
        Primary => "PRIMARY",
        Secondary => "SECONDARY",
        Overflow => "OVERFLOW",
        Floating => "FLOATING",
    }
);

string_enum!(
    Handling {
        Inline => "INLINE",
        FullPage => "FULL_PAGE",
    }
);

string_enum!(
    Channel {
        Fcm => "FCM",
        Email => "EMAIL",
        Sms => "SMS",
        Whatsapp => "WHATSAPP",
    }
);

string_enum!(
    LinkType {
        PngImage => "PNG_IMAGE",
        PdfDocument => "PDF_DOCUMENT",
        YoutubeVideo => "YOUTUBE_VIDEO",
    }
);

string_enum!(
    TextType {
        Plain => "PLAIN",
        Markdown => "MARKDOWN",
        Html => "HTML",
    }
);

string_enum!(
    /// Three-state filter: only true, only false, or no predicate at all.
    BooleanFilter {
        True => "TRUE",
        False => "FALSE",
        Both => "BOTH",
    }
);

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Show
    }
}

impl Default for Handling {
    fn default() -> Self {
        Handling::Inline
    }
}

impl Default for TextType {
    fn default() -> Self {
        TextType::Plain
    }
}

impl Default for BooleanFilter {
    fn default() -> Self {
        BooleanFilter::Both
    }
}

impl BooleanFilter {
    /// The value a column must equal, or `None` when unconstrained.
    pub fn as_predicate(&self) -> Option<bool> {
        match self {
            BooleanFilter::True => Some(true),
            BooleanFilter::False => Some(false),
            BooleanFilter::Both => None,
        }
    }

    pub fn accepts(&self, value: bool) -> bool {
        self.as_predicate().map_or(true, |expected| expected == value)
    }
}

/// The (uid, flavour) pair every feed operation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedScope {
    uid: String,
    flavour: Flavour,
}

impl FeedScope {
    pub fn new(uid: impl Into<String>, flavour: Flavour) -> Result<Self, DomainError> {
        let uid = uid.into();
        if uid.trim().is_empty() {
            return Err(DomainError::Precondition("uid is blank".to_string()));
        }
        Ok(Self { uid, flavour })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn flavour(&self) -> Flavour {
        self.flavour
    }

    /// Feed identifier, `uid|FLAVOUR`.
    pub fn feed_id(&self) -> String {
        format!("{}|{}", self.uid, self.flavour)
    }
}

impl fmt::Display for FeedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.feed_id())
    }
}
