//! Book model and the form view model used by the edit and add pages

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Book entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub author: String,
    pub title: String,
    pub description: String,
}

/// New book creation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub author: String,
    pub title: String,
    pub description: String,
}

impl NewBook {
    pub fn new(
        author: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Book form fields, submitted by the browser and used to pre-populate the
/// edit page. Missing fields deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

impl BookForm {
    /// Trimmed copy of the submitted fields
    pub fn normalized(&self) -> Self {
        Self {
            author: self.author.trim().to_string(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        Self {
            author: book.author.clone(),
            title: book.title.clone(),
            description: book.description.clone(),
        }
    }
}

impl From<BookForm> for NewBook {
    fn from(form: BookForm) -> Self {
        Self {
            author: form.author,
            title: form.title,
            description: form.description,
        }
    }
}

/// The four records inserted by the seed route
pub fn demo_books() -> Vec<NewBook> {
    vec![
        NewBook::new(
            "Mary Shelley",
            "Frankenstein",
            "A horror story written by someone who could not scroll far enough to the right in the video for me to copy the full descriptions of each book",
        ),
        NewBook::new(
            "Henry James",
            "The Turn of the Screw",
            "Another Brick In The Wall by Pink Floyd is a good song",
        ),
        NewBook::new(
            "Max Weber",
            "The Protestant Work Ethic and the Spirit: Stallion of the Cimarron",
            "A blending of genres never before seen in fiction!",
        ),
        NewBook::new(
            "Robert Putnam",
            "Bowling Alone",
            "A classic late 2000s drama about the lead singer from Bowling For Soup, detailing his harrowing experience in solitary confinement.",
        ),
    ]
}
