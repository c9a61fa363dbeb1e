//! Blogpost CLI: manage posts, tags and categories.
//!
//! Usage:
//!   blogpost post <subcommand> [--db path] [--config path]
//!   blogpost label <subcommand> [--db path] [--config path]

use blogpost::{
    BlogEngine, CategorySelection, Config, LabelKind, OpenStore, Post, PostId, PostOrder,
    PostQuery, QueryResult, SqliteStore,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "blogpost",
    version,
    about = "Blog posts with reconciled tags and categories"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to the YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to SQLite database file (overrides the configuration)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage posts
    Post {
        #[command(subcommand)]
        action: PostAction,
    },
    /// Manage tags and categories
    Label {
        #[command(subcommand)]
        action: LabelAction,
    },
}

#[derive(Subcommand)]
enum PostAction {
    /// Create a post
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Defaults to the slugified title
        #[arg(long)]
        slug: Option<String>,
        /// Defaults to the current year
        #[arg(long)]
        year: Option<i32>,
        /// Defaults to the current month
        #[arg(long)]
        month: Option<u32>,
        #[arg(long)]
        publish: bool,
        /// Comma separated tag names
        #[arg(long)]
        tags: Option<String>,
        /// Category toggle, 1 to include and 0 to exclude (repeatable)
        #[arg(long = "category", value_name = "ID=FLAG")]
        categories: Vec<String>,
    },
    /// Update a post; omitted fields keep their value
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        #[arg(long, conflicts_with = "unpublish")]
        publish: bool,
        #[arg(long)]
        unpublish: bool,
        /// Replaces every tag; pass "" to clear them
        #[arg(long)]
        tags: Option<String>,
        #[arg(long = "category", value_name = "ID=FLAG")]
        categories: Vec<String>,
    },
    /// Show a post with its labels
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a post
    Delete { id: String },
    /// List posts, newest first
    List {
        #[arg(long, conflicts_with = "drafts")]
        published: bool,
        #[arg(long)]
        drafts: bool,
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
        /// Only posts tagged with this name (repeatable)
        #[arg(long = "tag", value_name = "NAME")]
        tags: Vec<String>,
        /// Only posts in this category (repeatable)
        #[arg(long = "category", value_name = "NAME")]
        categories: Vec<String>,
        #[arg(long, conflicts_with = "by_title")]
        oldest_first: bool,
        #[arg(long)]
        by_title: bool,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        offset: Option<usize>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum LabelAction {
    /// Create a tag, or a category with --category
    Create {
        name: String,
        #[arg(long)]
        category: bool,
    },
    /// List labels
    List {
        #[arg(long, conflicts_with = "categories")]
        tags: bool,
        #[arg(long)]
        categories: bool,
    },
}

fn init_logging(config: &Config, verbose: bool) -> Result<(), String> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        config.log_level().map_err(|e| e.to_string())?
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
    Ok(())
}

fn open_engine(config: &Config, db: Option<PathBuf>) -> Result<BlogEngine, String> {
    let timezone = config.timezone().map_err(|e| e.to_string())?;
    let db_path = db.unwrap_or_else(|| config.database.clone());
    let store = SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(BlogEngine::new(Arc::new(store)).with_timezone(timezone))
}

/// Parse repeated `ID=FLAG` arguments. No arguments leaves categories alone.
fn parse_category_args(args: &[String]) -> Result<Option<CategorySelection>, String> {
    if args.is_empty() {
        return Ok(None);
    }
    let mut pairs = Vec::with_capacity(args.len());
    for arg in args {
        match arg.split_once('=') {
            Some(pair) => pairs.push(pair),
            None => return Err(format!("expected ID=FLAG, got '{}'", arg)),
        }
    }
    Ok(Some(CategorySelection::from_form(pairs)))
}

fn parse_post_id(raw: &str) -> Result<PostId, String> {
    raw.parse::<PostId>()
        .map_err(|_| format!("'{}' is not a post id", raw))
}

fn permalink(post: &Post) -> String {
    match (post.year, post.month, post.slug.as_deref()) {
        (Some(year), Some(month), Some(slug)) => format!("/{}/{:02}/{}", year, month, slug),
        _ => "-".to_string(),
    }
}

fn cmd_post_save(engine: &BlogEngine, post: &mut Post) -> i32 {
    let created = post.is_new();
    match engine.save_post(post) {
        Ok(()) => {
            let verb = if created { "Created" } else { "Updated" };
            println!("{} post {} at {}", verb, post.id, permalink(post));
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_post_create(
    engine: &BlogEngine,
    title: String,
    content: String,
    slug: Option<String>,
    year: Option<i32>,
    month: Option<u32>,
    publish: bool,
    tags: Option<String>,
    categories: &[String],
) -> i32 {
    let selection = match parse_category_args(categories) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let mut post = Post::new(title, content);
    post.slug = slug;
    post.year = year;
    post.month = month;
    post.is_published = publish;
    post.desired_tags = tags;
    post.desired_categories = selection;
    cmd_post_save(engine, &mut post)
}

#[allow(clippy::too_many_arguments)]
fn cmd_post_update(
    engine: &BlogEngine,
    id: &str,
    title: Option<String>,
    content: Option<String>,
    slug: Option<String>,
    year: Option<i32>,
    month: Option<u32>,
    published: Option<bool>,
    tags: Option<String>,
    categories: &[String],
) -> i32 {
    let loaded = parse_post_id(id).and_then(|id| engine.load_post(&id).map_err(|e| e.to_string()));
    let mut post = match loaded {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let selection = match parse_category_args(categories) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if let Some(title) = title {
        post.title = title;
    }
    if let Some(content) = content {
        post.content = content;
    }
    if slug.is_some() {
        post.slug = slug;
    }
    if year.is_some() {
        post.year = year;
    }
    if month.is_some() {
        post.month = month;
    }
    if let Some(published) = published {
        post.is_published = published;
    }
    post.desired_tags = tags;
    post.desired_categories = selection;
    cmd_post_save(engine, &mut post)
}

fn cmd_post_show(engine: &BlogEngine, id: &str, json: bool) -> i32 {
    let loaded = parse_post_id(id).and_then(|id| engine.load_post(&id).map_err(|e| e.to_string()));
    let mut post = match loaded {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let labels = engine
        .tag_names(&mut post)
        .and_then(|tags| Ok((tags, engine.categories(&post)?)));
    let (tags, categories) = match labels {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let category_names: Vec<String> = categories.into_iter().map(|c| c.name).collect();

    if json {
        let doc = serde_json::json!({
            "post": post,
            "tags": tags,
            "categories": category_names,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
        return 0;
    }

    println!("{}", post.title);
    println!("  id:         {}", post.id);
    println!("  permalink:  {}", permalink(&post));
    println!("  published:  {}", if post.is_published { "yes" } else { "no" });
    if let Some(created) = post.created_at {
        println!("  created:    {}", created.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("  tags:       {}", tags);
    println!("  categories: {}", category_names.join(", "));
    println!();
    println!("{}", post.content);
    0
}

fn cmd_post_delete(engine: &BlogEngine, id: &str) -> i32 {
    let id = match parse_post_id(id) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    match engine.delete_post(&id) {
        Ok(true) => {
            println!("Deleted post {}", id);
            0
        }
        Ok(false) => {
            eprintln!("Error: post {} not found", id);
            1
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn print_post_table(result: &QueryResult) {
    if result.posts.is_empty() {
        println!("No posts");
        return;
    }
    println!("{:<36}  {:<7}  {:<5}  {:<30}  TITLE", "ID", "DATE", "STATE", "SLUG");
    for post in &result.posts {
        let date = match (post.year, post.month) {
            (Some(year), Some(month)) => format!("{}-{:02}", year, month),
            _ => "-".to_string(),
        };
        let state = if post.is_published { "live" } else { "draft" };
        println!(
            "{:<36}  {:<7}  {:<5}  {:<30}  {}",
            post.id,
            date,
            state,
            post.slug.as_deref().unwrap_or("-"),
            post.title
        );
    }
    if result.total_count > result.posts.len() {
        println!("({} of {} posts)", result.posts.len(), result.total_count);
    }
}

fn cmd_post_list(engine: &BlogEngine, query: &PostQuery, json: bool) -> i32 {
    let result = match engine.find_posts(query) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    if json {
        let doc = serde_json::json!({
            "total_count": result.total_count,
            "posts": result.posts,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        }
    } else {
        print_post_table(&result);
    }
    0
}

fn cmd_label_create(engine: &BlogEngine, name: &str, kind: LabelKind) -> i32 {
    match engine.create_label(name, kind) {
        Ok(label) => {
            println!("Created {} '{}' ({})", kind, label.name, label.id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_label_list(engine: &BlogEngine, kind: Option<LabelKind>) -> i32 {
    match engine.labels(kind) {
        Ok(labels) => {
            if labels.is_empty() {
                println!("No labels");
            } else {
                for label in labels {
                    println!("{}  {:<8}  {}", label.id, label.kind.to_string(), label.name);
                }
            }
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = init_logging(&config, cli.verbose) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    let engine = match open_engine(&config, cli.db) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Post { action } => match action {
            PostAction::Create { title, content, slug, year, month, publish, tags, categories } => {
                cmd_post_create(&engine, title, content, slug, year, month, publish, tags, &categories)
            }
            PostAction::Update {
                id,
                title,
                content,
                slug,
                year,
                month,
                publish,
                unpublish,
                tags,
                categories,
            } => {
                let published = match (publish, unpublish) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                cmd_post_update(&engine, &id, title, content, slug, year, month, published, tags, &categories)
            }
            PostAction::Show { id, json } => cmd_post_show(&engine, &id, json),
            PostAction::Delete { id } => cmd_post_delete(&engine, &id),
            PostAction::List {
                published,
                drafts,
                year,
                month,
                tags,
                categories,
                oldest_first,
                by_title,
                limit,
                offset,
                json,
            } => {
                let order = if oldest_first {
                    PostOrder::OldestFirst
                } else if by_title {
                    PostOrder::Title
                } else {
                    PostOrder::NewestFirst
                };
                let mut query = PostQuery::ordered_by(order);
                if published {
                    query = query.published();
                }
                if drafts {
                    query = query.drafts();
                }
                if let Some(year) = year {
                    query = query.for_year(year);
                }
                if let Some(month) = month {
                    query = query.for_month(month);
                }
                for name in &tags {
                    query = query.tagged_with(name);
                }
                for name in &categories {
                    query = query.categorized_as(name);
                }
                if let Some(limit) = limit {
                    query = query.limit(limit);
                }
                if let Some(offset) = offset {
                    query = query.offset(offset);
                }
                cmd_post_list(&engine, &query, json)
            }
        },
        Commands::Label { action } => match action {
            LabelAction::Create { name, category } => {
                let kind = if category { LabelKind::Category } else { LabelKind::Tag };
                cmd_label_create(&engine, &name, kind)
            }
            LabelAction::List { tags, categories } => {
                let kind = if tags {
                    Some(LabelKind::Tag)
                } else if categories {
                    Some(LabelKind::Category)
                } else {
                    None
                };
                cmd_label_list(&engine, kind)
            }
        },
    };
    std::process::exit(code);
}
