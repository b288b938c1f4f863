use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Asset category from the path table.
///
/// Each category maps to one transform task of the same name, one output
/// subdirectory and one watch binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Html,
    Css,
    Scripts,
    Img,
    Fonts,
    Libs,
}

impl Category {
    /// Every category, in build-declaration order.
    pub const ALL: [Category; 6] = [
        Category::Html,
        Category::Css,
        Category::Scripts,
        Category::Img,
        Category::Fonts,
        Category::Libs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Html => "html",
            Category::Css => "css",
            Category::Scripts => "scripts",
            Category::Img => "img",
            Category::Fonts => "fonts",
            Category::Libs => "libs",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                format!(
                    "unknown category: {s} (expected one of html, css, scripts, img, fonts, libs)"
                )
            })
    }
}

/// Behaviour when a watched task is triggered again while it is still part
/// of the active run.
///
/// - `Queue`: remember the trigger and start a new run when the current one
///   settles (default behaviour).
/// - `Cancel`: drop any previously queued batch and only keep the latest
///   trigger. The running task itself is never interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}
