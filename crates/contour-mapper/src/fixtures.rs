//! Fixture model types and end-to-end mapping tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use contour_store::{
    AccessPolicy, InMemoryRecordStore, Record, RecordStore, StoreResult,
};
use contour_types::Guid;

/// Record store that counts reads, to observe when lazy references load.
pub struct CountingStore {
    inner: InMemoryRecordStore,
    reads: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: InMemoryRecordStore) -> Self {
        Self {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl RecordStore for CountingStore {
    fn get_item(&self, id: &Guid) -> StoreResult<Option<Record>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_item(id)
    }

    fn children(&self, parent: &Guid) -> StoreResult<Vec<Record>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.children(parent)
    }

    fn add_item(&self, record: Record) -> StoreResult<()> {
        self.inner.add_item(record)
    }

    fn save_item(&self, record: &Record) -> StoreResult<()> {
        self.inner.save_item(record)
    }

    fn access(&self) -> &AccessPolicy {
        self.inner.access()
    }
}

pub mod site {
    use chrono::NaiveDateTime;
    use contour_types::{Guid, Language};

    use crate::catalog::TypeCatalog;
    use crate::declaration::{ClassMarker, Mapped, PropertyMarker, TypeDescriptor, ValueKind};
    use crate::error::MapperResult;
    use crate::fields::Image;
    use crate::lazy::Lazy;
    use crate::value::PropertyValues;

    pub const CATALOG: &str = "site";
    pub const MAPPED_TYPES: usize = 6;

    pub const FOLDER_TEMPLATE: Guid = Guid::from_u128(0xf01d_0000_0000_4000_8000_000000000001);
    pub const ARTICLE_TEMPLATE: Guid = Guid::from_u128(0xa271_0000_0000_4000_8000_000000000002);
    pub const AUTHOR_TEMPLATE: Guid = Guid::from_u128(0xa074_0000_0000_4000_8000_000000000003);
    pub const NODE_TEMPLATE: Guid = Guid::from_u128(0x40de_0000_0000_4000_8000_000000000004);

    pub fn catalog() -> TypeCatalog {
        TypeCatalog::new(CATALOG)
            .with::<Folder>()
            .with::<Article>()
            .with::<Author>()
            .with::<Summary>()
            .with::<Index>()
            .with::<Node>()
            .with::<Content>()
            .with::<Unmarked>()
    }

    /// Shared base declarations. Not mapped itself.
    pub struct Content;

    impl Mapped for Content {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::unmarked()
                .property("Id", ValueKind::Guid, PropertyMarker::Id)
                .property("Title", ValueKind::Text, PropertyMarker::field())
        }

        fn from_values(_values: &mut PropertyValues) -> MapperResult<Self> {
            Ok(Content)
        }

        fn to_values(&self, _values: &mut PropertyValues) {}
    }

    #[derive(Clone, Debug)]
    pub struct Folder {
        pub id: Guid,
        pub title: String,
        pub articles: Vec<Lazy<Article>>,
    }

    impl Mapped for Folder {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::class(ClassMarker::template(FOLDER_TEMPLATE.to_string()))
                .property("Articles", ValueKind::list_of::<Article>(), PropertyMarker::children())
                .inherits::<Content>()
        }

        fn from_values(values: &mut PropertyValues) -> MapperResult<Self> {
            Ok(Self {
                id: values.take("Id")?,
                title: values.take("Title")?,
                articles: values.take("Articles")?,
            })
        }

        fn to_values(&self, values: &mut PropertyValues) {
            values.put("Id", &self.id);
            values.put("Title", &self.title);
            values.put("Articles", &self.articles);
        }
    }

    #[derive(Clone, Debug)]
    pub struct Article {
        pub id: Guid,
        pub language: Language,
        pub version: i32,
        pub title: String,
        pub body: String,
        pub views: i64,
        pub published: bool,
        pub date: NaiveDateTime,
        pub hero: Option<Image>,
        pub parent: Option<Lazy<Folder>>,
        pub author: Option<Lazy<Author>>,
        pub draft: String,
    }

    impl Mapped for Article {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::class(ClassMarker::template(ARTICLE_TEMPLATE.to_string()))
                .property("Language", ValueKind::Language, PropertyMarker::Language)
                .property("Version", ValueKind::Version, PropertyMarker::Version)
                .property("Body", ValueKind::Text, PropertyMarker::field_named("Body Text"))
                .property("Views", ValueKind::Integer, PropertyMarker::field())
                .property("Published", ValueKind::Boolean, PropertyMarker::field())
                .property("Date", ValueKind::DateTime, PropertyMarker::field())
                .property("Hero", ValueKind::Image, PropertyMarker::field_named("Image"))
                .property("Parent", ValueKind::object::<Folder>(), PropertyMarker::parent())
                .property(
                    "Author",
                    ValueKind::object::<Author>(),
                    PropertyMarker::reference().writable(),
                )
                .unmapped("Draft", ValueKind::Text)
                .inherits::<Content>()
        }

        fn from_values(values: &mut PropertyValues) -> MapperResult<Self> {
            Ok(Self {
                id: values.take("Id")?,
                language: values.take("Language")?,
                version: values.take("Version")?,
                title: values.take("Title")?,
                body: values.take("Body")?,
                views: values.take("Views")?,
                published: values.take("Published")?,
                date: values.take("Date")?,
                hero: values.take("Hero")?,
                parent: values.take("Parent")?,
                author: values.take("Author")?,
                draft: String::new(),
            })
        }

        fn to_values(&self, values: &mut PropertyValues) {
            values.put("Id", &self.id);
            values.put("Language", &self.language);
            values.put("Version", &self.version);
            values.put("Title", &self.title);
            values.put("Body", &self.body);
            values.put("Views", &self.views);
            values.put("Published", &self.published);
            values.put("Date", &self.date);
            values.put("Hero", &self.hero);
            values.put("Parent", &self.parent);
            values.put("Author", &self.author);
        }
    }

    #[derive(Clone, Debug)]
    pub struct Author {
        pub id: Guid,
        pub name: String,
    }

    impl Mapped for Author {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::class(ClassMarker::template(AUTHOR_TEMPLATE.to_string()))
                .property("Id", ValueKind::Guid, PropertyMarker::Id)
                .property("Name", ValueKind::Text, PropertyMarker::field_named("Full Name"))
        }

        fn from_values(values: &mut PropertyValues) -> MapperResult<Self> {
            Ok(Self {
                id: values.take("Id")?,
                name: values.take("Name")?,
            })
        }

        fn to_values(&self, values: &mut PropertyValues) {
            values.put("Id", &self.id);
            values.put("Name", &self.name);
        }
    }

    /// A template-less view over any item, with its parent loaded eagerly.
    #[derive(Clone, Debug)]
    pub struct Summary {
        pub id: Guid,
        pub title: String,
        pub parent: Option<Lazy<Folder>>,
    }

    impl Mapped for Summary {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::class(ClassMarker::new())
                .property("Id", ValueKind::Guid, PropertyMarker::Id)
                .property("Title", ValueKind::Text, PropertyMarker::field().read_only())
                .property("Parent", ValueKind::object::<Folder>(), PropertyMarker::parent().eager())
        }

        fn from_values(values: &mut PropertyValues) -> MapperResult<Self> {
            Ok(Self {
                id: values.take("Id")?,
                title: values.take("Title")?,
                parent: values.take("Parent")?,
            })
        }

        fn to_values(&self, values: &mut PropertyValues) {
            values.put("Id", &self.id);
            values.put("Title", &self.title);
            values.put("Parent", &self.parent);
        }
    }

    /// A template-less listing whose articles load eagerly.
    #[derive(Clone, Debug)]
    pub struct Index {
        pub id: Guid,
        pub articles: Vec<Lazy<Article>>,
    }

    impl Mapped for Index {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::class(ClassMarker::new())
                .property("Id", ValueKind::Guid, PropertyMarker::Id)
                .property(
                    "Articles",
                    ValueKind::list_of::<Article>(),
                    PropertyMarker::children().eager(),
                )
        }

        fn from_values(values: &mut PropertyValues) -> MapperResult<Self> {
            Ok(Self {
                id: values.take("Id")?,
                articles: values.take("Articles")?,
            })
        }

        fn to_values(&self, values: &mut PropertyValues) {
            values.put("Id", &self.id);
            values.put("Articles", &self.articles);
        }
    }

    /// A tree node whose parent and children both load eagerly.
    #[derive(Clone, Debug)]
    pub struct Node {
        pub id: Guid,
        pub parent: Option<Lazy<Node>>,
        pub children: Vec<Lazy<Node>>,
    }

    impl Mapped for Node {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::class(ClassMarker::template(NODE_TEMPLATE.to_string()))
                .property("Id", ValueKind::Guid, PropertyMarker::Id)
                .property("Parent", ValueKind::object::<Node>(), PropertyMarker::parent().eager())
                .property(
                    "Children",
                    ValueKind::list_of::<Node>(),
                    PropertyMarker::children().eager(),
                )
        }

        fn from_values(values: &mut PropertyValues) -> MapperResult<Self> {
            Ok(Self {
                id: values.take("Id")?,
                parent: values.take("Parent")?,
                children: values.take("Children")?,
            })
        }

        fn to_values(&self, values: &mut PropertyValues) {
            values.put("Id", &self.id);
            values.put("Parent", &self.parent);
            values.put("Children", &self.children);
        }
    }

    /// Registered in the catalog but carries no class marker.
    pub struct Unmarked;

    impl Mapped for Unmarked {
        fn describe() -> TypeDescriptor {
            TypeDescriptor::unmarked().property("Id", ValueKind::Guid, PropertyMarker::Id)
        }

        fn from_values(_values: &mut PropertyValues) -> MapperResult<Self> {
            Ok(Unmarked)
        }

        fn to_values(&self, _values: &mut PropertyValues) {}
    }
}

pub mod broken {
    use crate::catalog::TypeCatalog;
    use crate::declaration::{ClassMarker, Mapped, PropertyMarker, TypeDescriptor, ValueKind};
    use crate::error::MapperResult;
    use crate::value::PropertyValues;

    pub const CATALOG: &str = "broken";
    pub const REJECTED_TYPES: usize = 3;

    pub fn catalog() -> TypeCatalog {
        TypeCatalog::new(CATALOG)
            .with::<DuplicateId>()
            .with::<BadTemplate>()
            .with::<Dangling>()
    }

    macro_rules! unit_mapped {
        ($name:ident, $describe:expr) => {
            pub struct $name;

            impl Mapped for $name {
                fn describe() -> TypeDescriptor {
                    $describe
                }

                fn from_values(_values: &mut PropertyValues) -> MapperResult<Self> {
                    Ok($name)
                }

                fn to_values(&self, _values: &mut PropertyValues) {}
            }
        };
    }

    unit_mapped!(
        DuplicateId,
        TypeDescriptor::class(ClassMarker::new())
            .property("Id", ValueKind::Guid, PropertyMarker::Id)
            .property("AlsoId", ValueKind::Guid, PropertyMarker::Id)
    );
    unit_mapped!(
        BadTemplate,
        TypeDescriptor::class(ClassMarker::template("{not-a-template}"))
    );
    unit_mapped!(
        Dangling,
        TypeDescriptor::class(ClassMarker::new())
            .property("Parent", ValueKind::object::<Orphan>(), PropertyMarker::parent())
    );
    // Marked, but never offered by any catalog.
    unit_mapped!(Orphan, TypeDescriptor::class(ClassMarker::new()));
}

/// Item identifiers in [`site_store`].
pub mod ids {
    use contour_types::Guid;

    pub const HOME: Guid = Guid::from_u128(0x1000);
    pub const FIRST: Guid = Guid::from_u128(0x1001);
    pub const SECOND: Guid = Guid::from_u128(0x1002);
    pub const WRITER: Guid = Guid::from_u128(0x1003);
    pub const EDITOR: Guid = Guid::from_u128(0x1004);
    pub const ROOT_NODE: Guid = Guid::from_u128(0x2000);
    pub const LEAF_NODE: Guid = Guid::from_u128(0x2001);
    pub const MEDIA: Guid = Guid::from_u128(0x210faf49_5aa4_471e_bbfe_b4d3acb6adc0);
}

pub const STORED_IMAGE: &str = r#"<image mediaid="{210FAF49-5AA4-471E-BBFE-B4D3ACB6ADC0}" alt="test alt" height="540" width="720" hspace="50" vspace="60" />"#;

/// A small site: one folder holding two articles and their author, a
/// top-level editor, and a two-node tree.
pub fn site_store() -> InMemoryRecordStore {
    use site::*;
    let records = vec![
        Record::new(ids::HOME, FOLDER_TEMPLATE, "home").with_field("Title", "Home"),
        Record::new(ids::FIRST, ARTICLE_TEMPLATE, "first")
            .with_parent(ids::HOME)
            .with_version(2)
            .with_field("Title", "First article")
            .with_field("Body Text", "Hello world")
            .with_field("Views", "42")
            .with_field("Published", "1")
            .with_field("Date", "20110314T123005Z")
            .with_field("Image", STORED_IMAGE)
            .with_field("Author", ids::WRITER.to_string()),
        Record::new(ids::SECOND, ARTICLE_TEMPLATE, "second")
            .with_parent(ids::HOME)
            .with_field("Title", "Second article"),
        Record::new(ids::WRITER, AUTHOR_TEMPLATE, "writer")
            .with_parent(ids::HOME)
            .with_field("Full Name", "Ada Writer"),
        Record::new(ids::EDITOR, AUTHOR_TEMPLATE, "editor").with_field("Full Name", "Eve Editor"),
        Record::new(ids::ROOT_NODE, NODE_TEMPLATE, "root"),
        Record::new(ids::LEAF_NODE, NODE_TEMPLATE, "leaf").with_parent(ids::ROOT_NODE),
    ];
    match InMemoryRecordStore::with_records(records) {
        Ok(store) => store,
        Err(e) => panic!("fixture store: {e}"),
    }
}

mod tests {
    use chrono::NaiveDateTime;

    use super::site::{Article, Author, Folder, Index, Node, Summary};
    use super::*;
    use crate::catalog::SourceGroup;
    use crate::chain::HandlerChain;
    use crate::config::MapperConfig;
    use crate::declaration::PropertyDeclaration;
    use crate::error::{ConfigError, MapperError};
    use crate::handler::{BoundField, FieldHandler, HandlerTarget};
    use crate::handlers::ScalarHandler;
    use crate::fields::Image;
    use crate::lazy::Lazy;
    use crate::loader::CatalogLoader;
    use crate::registry::{LoadPolicy, Registry};
    use crate::service::MappingService;

    fn registry() -> Arc<Registry> {
        let loader = CatalogLoader::new([site::catalog()]).group(SourceGroup::new("", site::CATALOG));
        Arc::new(
            Registry::build(&[&loader], &HandlerChain::with_default_handlers(), LoadPolicy::Strict)
                .unwrap(),
        )
    }

    fn service() -> MappingService {
        MappingService::new(registry(), Arc::new(site_store()))
    }

    fn counting() -> (MappingService, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::new(site_store()));
        (MappingService::new(registry(), store.clone()), store)
    }

    fn first_article(service: &MappingService) -> Article {
        service.get_item::<Article>(&ids::FIRST).unwrap().unwrap()
    }

    // ---- reading ----

    #[test]
    fn maps_every_field_kind() {
        let article = first_article(&service());
        assert_eq!(article.id, ids::FIRST);
        assert_eq!(article.language.code(), "en");
        assert_eq!(article.version, 2);
        assert_eq!(article.title, "First article");
        assert_eq!(article.body, "Hello world");
        assert_eq!(article.views, 42);
        assert!(article.published);
        assert_eq!(article.date.to_string(), "2011-03-14 12:30:05");
        assert_eq!(article.draft, "");

        let hero = article.hero.unwrap();
        assert_eq!(hero.alt, "test alt");
        assert_eq!((hero.width, hero.height), (720, 540));
        assert_eq!((hero.hspace, hero.vspace), (50, 60));
        assert_eq!(hero.media_id, ids::MEDIA);
    }

    #[test]
    fn absent_fields_read_as_zero_values() {
        let article = service().get_item::<Article>(&ids::SECOND).unwrap().unwrap();
        assert_eq!(article.body, "");
        assert_eq!(article.views, 0);
        assert!(!article.published);
        assert_eq!(article.date, NaiveDateTime::default());
        assert!(article.hero.is_none());
        assert!(article.author.is_none());
    }

    #[test]
    fn missing_item_is_none() {
        assert!(service()
            .get_item::<Article>(&Guid::from_u128(0xffff))
            .unwrap()
            .is_none());
    }

    #[test]
    fn unmapped_type_is_reported() {
        let record = service().store().require_item(&ids::HOME).unwrap();
        assert!(matches!(
            service().map_to_object::<site::Unmarked>(&record),
            Err(MapperError::NotMapped { .. })
        ));
    }

    // ---- lazy and eager relationships ----

    #[test]
    fn lazy_parent_loads_on_first_access() {
        let (service, store) = counting();
        let article = first_article(&service);
        let reads = store.reads();

        let parent = article.parent.as_ref().unwrap();
        assert_eq!(parent.id(), ids::HOME);
        assert!(!parent.is_loaded());
        assert_eq!(store.reads(), reads);

        assert_eq!(parent.get().unwrap().title, "Home");
        assert!(parent.is_loaded());
        let after_first = store.reads();
        assert!(after_first > reads);

        parent.get().unwrap();
        assert_eq!(store.reads(), after_first);
    }

    #[test]
    fn clones_of_a_pending_reference_load_once() {
        let (service, store) = counting();
        let measured = first_article(&service).parent.unwrap();
        let before = store.reads();
        measured.get().unwrap();
        let one_load = store.reads() - before;

        let parent = first_article(&service).parent.unwrap();
        let copy = parent.clone();
        let before = store.reads();
        let home = parent.get().unwrap();
        assert!(copy.is_loaded());
        assert!(std::ptr::eq(home, copy.get().unwrap()));
        assert_eq!(store.reads() - before, one_load);
    }

    #[test]
    fn concurrent_first_access_loads_once() {
        let (service, store) = counting();
        let measured = first_article(&service).parent.unwrap();
        let before = store.reads();
        measured.get().unwrap();
        let one_load = store.reads() - before;

        let parent = first_article(&service).parent.unwrap();
        let start = std::sync::Barrier::new(4);
        let before = store.reads();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let copy = parent.clone();
                let start = &start;
                scope.spawn(move || {
                    start.wait();
                    assert_eq!(copy.get().unwrap().title, "Home");
                });
            }
        });
        assert!(parent.is_loaded());
        assert_eq!(store.reads() - before, one_load);
    }

    #[test]
    fn lazy_reference_outlives_the_service() {
        let article = first_article(&service());
        let author = article.author.unwrap();
        assert_eq!(author.id(), ids::WRITER);
        assert_eq!(author.get().unwrap().name, "Ada Writer");
    }

    #[test]
    fn eager_parent_is_loaded_immediately() {
        let summary = service().get_item::<Summary>(&ids::FIRST).unwrap().unwrap();
        assert_eq!(summary.title, "First article");
        let parent = summary.parent.unwrap();
        assert!(parent.is_loaded());
        assert_eq!(parent.get().unwrap().title, "Home");
    }

    #[test]
    fn children_follow_the_related_template() {
        let folder = service().get_item::<Folder>(&ids::HOME).unwrap().unwrap();
        let found: Vec<_> = folder.articles.iter().map(Lazy::id).collect();
        assert_eq!(found, vec![ids::FIRST, ids::SECOND]);
        assert!(folder.articles.iter().all(|a| !a.is_loaded()));
        assert_eq!(folder.articles[1].get().unwrap().title, "Second article");
    }

    #[test]
    fn eager_children_are_loaded_immediately() {
        let (service, store) = counting();
        let index = service.get_item::<Index>(&ids::HOME).unwrap().unwrap();
        let found: Vec<_> = index.articles.iter().map(Lazy::id).collect();
        assert_eq!(found, vec![ids::FIRST, ids::SECOND]);
        assert!(index.articles.iter().all(Lazy::is_loaded));

        let reads = store.reads();
        assert_eq!(index.articles[0].get().unwrap().title, "First article");
        assert_eq!(index.articles[1].get().unwrap().title, "Second article");
        assert_eq!(store.reads(), reads);
    }

    #[test]
    fn eager_cycle_is_detected() {
        let err = service()
            .get_item::<Node>(&ids::LEAF_NODE)
            .unwrap_err();
        match err {
            MapperError::CyclicReference { id, type_name } => {
                assert_eq!(id, ids::LEAF_NODE);
                assert!(type_name.contains("Node"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The root's eager child points back at the root.
        assert!(matches!(
            service().get_item::<Node>(&ids::ROOT_NODE),
            Err(MapperError::CyclicReference { .. })
        ));
    }

    // ---- writing ----

    #[test]
    fn map_to_record_writes_writable_properties() {
        let service = service();
        let mut article = first_article(&service);
        article.title = "Renamed".into();
        article.views = 7;
        article.published = false;
        article.version = 99;

        let mut record = service.store().require_item(&ids::FIRST).unwrap();
        let mut scope = service.store().begin_edit(&mut record).unwrap();
        service.map_to_record(&article, &mut scope).unwrap();
        scope.commit();

        assert_eq!(record.field("Title"), Some("Renamed"));
        assert_eq!(record.field("Views"), Some("7"));
        assert_eq!(record.field("Published"), Some(""));
        assert_eq!(record.field("Author"), Some(ids::WRITER.to_string().as_str()));
        assert_eq!(record.version, 2);
    }

    #[test]
    fn uncommitted_scope_changes_nothing() {
        let service = service();
        let mut article = first_article(&service);
        article.title = "Discarded".into();

        let mut record = service.store().require_item(&ids::FIRST).unwrap();
        {
            let mut scope = service.store().begin_edit(&mut record).unwrap();
            service.map_to_record(&article, &mut scope).unwrap();
        }
        assert_eq!(record.field("Title"), Some("First article"));
    }

    #[test]
    fn nil_media_id_and_no_image() {
        let service = service();
        let mut article = first_article(&service);
        article.hero = Some(Image {
            media_id: Guid::nil(),
            ..article.hero.clone().unwrap()
        });
        service.save(&article).unwrap();
        let hero = first_article(&service).hero.unwrap();
        assert!(hero.media_id.is_nil());
        assert_eq!(hero.alt, "test alt");
        assert_eq!(hero.width, 720);

        article.hero = None;
        service.save(&article).unwrap();
        let record = service.store().require_item(&ids::FIRST).unwrap();
        assert_eq!(record.field("Image"), Some(""));
        assert!(first_article(&service).hero.is_none());
    }

    #[test]
    fn save_persists_round_trip() {
        let service = service();
        let mut article = first_article(&service);
        article.title = "Saved".into();
        article.body = "New body".into();
        article.author = Some(Lazy::detached(ids::EDITOR));
        service.save(&article).unwrap();

        let reloaded = first_article(&service);
        assert_eq!(reloaded.title, "Saved");
        assert_eq!(reloaded.body, "New body");
        assert_eq!(reloaded.views, 42);
        assert_eq!(reloaded.hero, article.hero);
        let author = reloaded.author.unwrap();
        assert_eq!(author.id(), ids::EDITOR);
        assert_eq!(author.get().unwrap().name, "Eve Editor");
    }

    #[test]
    fn save_overrides_protection() {
        let store = InMemoryRecordStore::new();
        store
            .add_item(
                Record::new(ids::WRITER, site::AUTHOR_TEMPLATE, "writer")
                    .with_field("Full Name", "Locked")
                    .protected(),
            )
            .unwrap();
        let service = MappingService::new(registry(), Arc::new(store));

        let mut record = service.store().require_item(&ids::WRITER).unwrap();
        assert!(service.store().begin_edit(&mut record).is_err());

        let author = Author {
            id: ids::WRITER,
            name: "Unlocked".into(),
        };
        service.save(&author).unwrap();
        assert!(!service.store().access().is_overridden());
        let saved = service.get_item::<Author>(&ids::WRITER).unwrap().unwrap();
        assert_eq!(saved.name, "Unlocked");
    }

    #[test]
    fn save_requires_an_identity() {
        let author = Author {
            id: Guid::nil(),
            name: "Nobody".into(),
        };
        assert!(matches!(
            service().save(&author),
            Err(MapperError::Unsupported { .. })
        ));
    }

    #[test]
    fn read_only_properties_are_skipped_on_save() {
        let service = service();
        let mut summary = service.get_item::<Summary>(&ids::FIRST).unwrap().unwrap();
        summary.title = "Ignored".into();
        service.save(&summary).unwrap();
        assert_eq!(first_article(&service).title, "First article");
    }

    // ---- creating ----

    #[test]
    fn create_child_uses_the_type_template() {
        let service = service();
        let draft = Author {
            id: Guid::nil(),
            name: "New Writer".into(),
        };
        let created = service.create_child(&ids::HOME, "new-writer", &draft).unwrap();
        assert!(!created.id.is_nil());
        assert_eq!(created.name, "New Writer");

        let record = service.store().require_item(&created.id).unwrap();
        assert_eq!(record.template_id, site::AUTHOR_TEMPLATE);
        assert_eq!(record.parent_id, Some(ids::HOME));
        assert_eq!(record.name, "new-writer");
    }

    #[test]
    fn create_child_needs_a_template_and_parent() {
        let service = service();
        let summary = service.get_item::<Summary>(&ids::FIRST).unwrap().unwrap();
        assert!(matches!(
            service.create_child(&ids::HOME, "x", &summary),
            Err(MapperError::Unsupported { .. })
        ));

        let author = Author {
            id: Guid::nil(),
            name: "Lost".into(),
        };
        assert!(matches!(
            service.create_child(&Guid::from_u128(0xbad), "x", &author),
            Err(MapperError::Store(_))
        ));
    }

    #[test]
    fn children_of_filters_by_template() {
        let service = service();
        let articles = service.children_of::<Article>(&ids::HOME).unwrap();
        assert_eq!(articles.len(), 2);
        let authors = service.children_of::<Author>(&ids::HOME).unwrap();
        assert_eq!(authors.len(), 1);
        assert_eq!(authors[0].name, "Ada Writer");
    }

    // ---- configuration ----

    /// Scalar handler that counts how often it is configured.
    struct CountingScalar {
        configured: AtomicUsize,
    }

    impl FieldHandler for CountingScalar {
        fn name(&self) -> &str {
            "counting-scalar"
        }

        fn can_handle(&self, property: &PropertyDeclaration) -> bool {
            ScalarHandler.can_handle(property)
        }

        fn configure(
            &self,
            target: &HandlerTarget<'_>,
        ) -> Result<Arc<dyn BoundField>, ConfigError> {
            self.configured.fetch_add(1, Ordering::SeqCst);
            ScalarHandler.configure(target)
        }
    }

    #[test]
    fn each_binding_is_configured_once() {
        let counting = Arc::new(CountingScalar {
            configured: AtomicUsize::new(0),
        });
        let mut chain = HandlerChain::with_default_handlers();
        chain.insert(0, counting.clone());

        let loader = CatalogLoader::new([site::catalog()]).group(SourceGroup::new("", site::CATALOG));
        let registry = Arc::new(Registry::build(&[&loader], &chain, LoadPolicy::Strict).unwrap());
        let bound = registry
            .schemas()
            .flat_map(|schema| schema.properties())
            .filter(|binding| binding.handler_name() == "counting-scalar")
            .count();
        assert!(bound > 0);
        assert_eq!(counting.configured.load(Ordering::SeqCst), bound);

        let service = MappingService::new(registry, Arc::new(site_store()));
        for _ in 0..3 {
            let article = first_article(&service);
            service.save(&article).unwrap();
        }
        assert_eq!(counting.configured.load(Ordering::SeqCst), bound);
    }

    #[test]
    fn service_from_toml_config() {
        let config = MapperConfig::from_toml_str(
            r#"
            source_groups = ["contour_mapper::fixtures::site, site"]
            policy = "strict"
            "#,
        )
        .unwrap();
        let service = MappingService::from_config(
            &config,
            [site::catalog()],
            &HandlerChain::with_default_handlers(),
            Arc::new(site_store()),
        )
        .unwrap();
        assert_eq!(service.registry().len(), site::MAPPED_TYPES);
        assert_eq!(first_article(&service).title, "First article");
    }

    #[test]
    fn strict_config_rejects_broken_catalog() {
        let config = MapperConfig::from_toml_str(
            "source_groups = [\", broken\"]\npolicy = \"strict\"",
        )
        .unwrap();
        let result = MappingService::from_config(
            &config,
            [broken::catalog()],
            &HandlerChain::with_default_handlers(),
            Arc::new(site_store()),
        );
        assert!(matches!(result, Err(MapperError::Configuration { .. })));
    }
}
