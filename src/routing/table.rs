// src/routing/table.rs
//! Built-in tag → source routes.
//!
//! Category ids are the providers' own:
//! - YouTube `videoCategoryId`: 1 film, 2 autos, 10 music, 15 pets, 17 sports,
//!   19 travel, 20 gaming, 23 comedy, 24 entertainment, 25 news & politics,
//!   26 howto & style, 27 education, 28 science & technology, 30 movies.
//! - Google Trends `category_id`: 1 autos, 2 beauty & fashion, 3 business,
//!   4 entertainment, 5 food, 6 games, 7 health, 9 education, 13 pets,
//!   14 politics, 15 science, 17 sports, 18 technology, 19 travel, 20 climate.
//!
//! Priority 3 = canonical source for the topic, 1 = loosely related.
//! Vocabulary tags missing here (e.g. "lifestyle") route nowhere.

use super::SourceId;

/// Static row of the built-in table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub source: SourceId,
    pub category: Option<&'static str>,
    pub priority: u8,
}

const fn forum(priority: u8) -> RouteSpec {
    RouteSpec {
        source: SourceId::Forum,
        category: None,
        priority,
    }
}

const fn video(category: &'static str, priority: u8) -> RouteSpec {
    RouteSpec {
        source: SourceId::Video,
        category: Some(category),
        priority,
    }
}

const fn video_any(priority: u8) -> RouteSpec {
    RouteSpec {
        source: SourceId::Video,
        category: None,
        priority,
    }
}

const fn papers(priority: u8) -> RouteSpec {
    RouteSpec {
        source: SourceId::PaperIndex,
        category: None,
        priority,
    }
}

const fn trends(category: &'static str, priority: u8) -> RouteSpec {
    RouteSpec {
        source: SourceId::Trends,
        category: Some(category),
        priority,
    }
}

const fn trends_any(priority: u8) -> RouteSpec {
    RouteSpec {
        source: SourceId::Trends,
        category: None,
        priority,
    }
}

pub const BUILTIN_ROUTES: &[(&str, &[RouteSpec])] = &[
    // AI / research
    ("ai", &[papers(3), video("28", 2), trends("18", 2)]),
    ("machine_learning", &[papers(3), video("28", 2), forum(1)]),
    ("deep_learning", &[papers(3), video("28", 1)]),
    ("nlp", &[papers(3)]),
    ("computer_vision", &[papers(3)]),
    ("model", &[papers(3)]),
    ("dataset", &[papers(3)]),
    ("paper", &[papers(3)]),
    ("research", &[papers(3), trends("15", 2)]),
    // Tech & science
    ("technology", &[video("28", 3), trends("18", 3), forum(1)]),
    ("programming", &[forum(3), video("28", 2)]),
    ("science", &[trends("15", 3), video("28", 2), forum(1)]),
    ("space", &[trends("15", 2), video("28", 2), forum(1)]),
    // Entertainment
    ("movies", &[video("30", 3), trends("4", 2), forum(1)]),
    ("music", &[video("10", 3), trends("4", 2), forum(1)]),
    ("gaming", &[video("20", 3), trends("6", 2), forum(1)]),
    ("entertainment", &[video("24", 3), trends("4", 3)]),
    ("comedy", &[video("23", 3), forum(1)]),
    ("anime", &[video("1", 2), forum(2)]),
    ("celebrity", &[trends("4", 3), video("24", 2)]),
    ("tv_shows", &[video("24", 2), trends("4", 2), forum(1)]),
    // News & society
    ("news", &[forum(3), video("25", 2)]),
    ("politics", &[trends("14", 3), video("25", 2), forum(1)]),
    ("politician", &[video("25", 3), trends("14", 2)]),
    ("economy", &[trends("3", 3), video("25", 1)]),
    ("business", &[trends("3", 3), forum(1)]),
    ("finance", &[trends("3", 3), forum(2)]),
    ("crypto", &[forum(3), trends("3", 2)]),
    ("climate", &[trends("20", 3), forum(1)]),
    ("environment", &[trends("20", 2), video("28", 1)]),
    ("health", &[trends("7", 3), video("26", 1)]),
    ("education", &[video("27", 3), trends("9", 2)]),
    // Lifestyle
    ("sports", &[trends("17", 3), video("17", 3)]),
    ("football", &[video("17", 3), trends("17", 2), forum(1)]),
    ("travel", &[video("19", 3), trends("19", 2)]),
    ("food", &[trends("5", 3), video("26", 2)]),
    ("fashion", &[trends("2", 3), video("26", 2)]),
    ("pets", &[video("15", 3), trends("13", 2)]),
    ("cars", &[video("2", 3), trends("1", 2), forum(1)]),
    // Community
    ("discussion", &[forum(3)]),
    ("community", &[forum(3)]),
    ("ask", &[forum(3)]),
    ("meme", &[forum(3), video("23", 1)]),
    // Meta
    ("trending", &[trends_any(3), video_any(2), forum(1)]),
];
