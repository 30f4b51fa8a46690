/// Extension-based file categorization.
///
/// This module maps file extensions (with their leading dot, e.g. `".pdf"`)
/// to one of a fixed set of categories. Each category owns a subfolder under
/// the organized root; anything that matches no category falls back to
/// [`Category::Other`].
///
/// # Examples
///
/// ```
/// use downtidy::file_category::{Category, CategoryTable};
///
/// let table = CategoryTable::default();
/// assert_eq!(table.classify(".png"), Category::Image);
/// assert_eq!(table.classify(".PDF"), Category::Document);
/// assert_eq!(table.classify(""), Category::Other);
/// ```
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// A classification label. Every variant owns one folder under the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// Office documents and plain text
    Document,
    /// Raster and vector images
    Image,
    /// Video containers
    Video,
    /// Audio files
    Audio,
    /// Compressed archives
    Archive,
    /// Installers, packages and scripts meant to be run
    Program,
    /// Source code
    Code,
    /// Font files
    Font,
    /// E-books
    Ebook,
    /// Catch-all for anything unmatched
    Other,
}

impl Category {
    /// Every category, in table order. `Other` is always last.
    pub const fn all() -> [Category; 10] {
        [
            Category::Document,
            Category::Image,
            Category::Video,
            Category::Audio,
            Category::Archive,
            Category::Program,
            Category::Code,
            Category::Font,
            Category::Ebook,
            Category::Other,
        ]
    }

    /// Returns the folder name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use downtidy::file_category::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "图片");
    /// assert_eq!(Category::Other.dir_name(), "其他");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Document => "文档",
            Category::Image => "图片",
            Category::Video => "视频",
            Category::Audio => "音频",
            Category::Archive => "压缩文件",
            Category::Program => "程序",
            Category::Code => "代码",
            Category::Font => "字体",
            Category::Ebook => "电子书",
            Category::Other => "其他",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

const STANDARD_EXTENSIONS: &[(Category, &[&str])] = &[
    (
        Category::Document,
        &[
            ".doc", ".docx", ".pdf", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt", ".pptx",
        ],
    ),
    (
        Category::Image,
        &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".svg", ".webp", ".tiff"],
    ),
    (
        Category::Video,
        &[".mp4", ".mov", ".avi", ".mkv", ".flv", ".wmv", ".webm", ".m4v"],
    ),
    (
        Category::Audio,
        &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".m4a", ".wma"],
    ),
    (
        Category::Archive,
        &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"],
    ),
    (
        Category::Program,
        &[".exe", ".msi", ".bat", ".sh", ".apk", ".deb", ".rpm"],
    ),
    (
        Category::Code,
        &[
            ".py", ".js", ".html", ".css", ".java", ".c", ".cpp", ".php", ".rb",
        ],
    ),
    (Category::Font, &[".ttf", ".otf", ".woff", ".woff2", ".eot"]),
    (Category::Ebook, &[".epub", ".mobi", ".azw3"]),
];

/// Read-only mapping from extensions to categories.
///
/// Built once at startup and handed to the organizer; it is never mutated
/// after that. Lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    extension_map: HashMap<String, Category>,
}

impl CategoryTable {
    /// Creates a table holding the standard mappings.
    pub fn new() -> Self {
        let mut table = Self {
            extension_map: HashMap::new(),
        };
        for (category, extensions) in STANDARD_EXTENSIONS {
            for ext in *extensions {
                table.insert(ext, *category);
            }
        }
        table
    }

    fn insert(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(ext.to_lowercase(), category);
    }

    /// Maps an extension (including its leading dot) to a category.
    ///
    /// Unknown and empty extensions resolve to [`Category::Other`].
    pub fn classify(&self, ext: &str) -> Category {
        self.extension_map
            .get(&ext.to_lowercase())
            .copied()
            .unwrap_or(Category::Other)
    }

    /// All category labels known to this table.
    pub fn categories(&self) -> impl Iterator<Item = Category> {
        Category::all().into_iter()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new()
    }
}
