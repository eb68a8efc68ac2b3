#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use pbn_core::{
    AssetResolver, Clock, GenerateError, Generator, LocalAssets, LookupError, ObjectStore,
    RawAsset, ResolverConfig, TransportError,
};

pub const MAP_JSON: &str = r#"[
    {"color": "(0, 0, 0)", "shapes": ["bg"]},
    {"color": "(255, 0, 0)", "shapes": ["s1", "s2"]},
    {"color": "(0, 255, 0)", "shapes": ["s3"]}
]"#;

pub const ART_SVG: &str = r#"<svg viewBox="0 0 10 10"><g id="bg"/><g id="s1"/><g id="s2"/><g id="s3"/></svg>"#;

pub const OTHER_MAP_JSON: &str = r#"[
    {"color": "(0, 0, 0)", "shapes": ["o0"]},
    {"color": "(0, 0, 255)", "shapes": ["o1"]}
]"#;

pub const OTHER_ART_SVG: &str = r#"<svg><g id="o0"/><g id="o1"/></svg>"#;

/// In-memory object store contents shared by the store and the generator.
#[derive(Default)]
pub struct Bucket {
    pub objects: RefCell<HashMap<String, Vec<u8>>>,
    pub offline: Cell<bool>,
    pub broken_fetch: Cell<bool>,
    pub lookups: Cell<usize>,
}

impl Bucket {
    pub fn put(&self, key: &str, bytes: &[u8]) {
        self.objects
            .borrow_mut()
            .insert(key.to_string(), bytes.to_vec());
    }
}

pub struct MemStore(pub Rc<Bucket>);

impl ObjectStore for MemStore {
    async fn download_url(&self, key: &str) -> Result<String, LookupError> {
        let b = &self.0;
        b.lookups.set(b.lookups.get() + 1);
        if b.offline.get() {
            return Err(TransportError::new("offline").into());
        }
        if b.objects.borrow().contains_key(key) {
            Ok(format!("mem://{key}"))
        } else {
            Err(LookupError::NotFound(key.to_string()))
        }
    }

    async fn fetch_content(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        if self.0.broken_fetch.get() {
            return Err(TransportError::new("connection reset"));
        }
        let key = url.strip_prefix("mem://").unwrap_or(url);
        self.0
            .objects
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| TransportError::new(format!("404 {url}")))
    }
}

pub enum GenBehavior {
    /// Write the given map and art next to the uploaded object.
    Populate(String, String),
    /// Report success without writing anything.
    Nothing,
    Fail,
}

pub struct FakeGenerator {
    pub bucket: Rc<Bucket>,
    pub behavior: GenBehavior,
    pub calls: Rc<Cell<usize>>,
    pub hook: Rc<RefCell<Option<Box<dyn Fn()>>>>,
}

impl Generator for FakeGenerator {
    async fn generate(&self, object: &str) -> Result<(), GenerateError> {
        self.calls.set(self.calls.get() + 1);
        if let Some(hook) = self.hook.borrow().as_ref() {
            hook();
        }
        match &self.behavior {
            GenBehavior::Populate(map, art) => {
                let base = object.rsplit_once('.').map_or(object, |(b, _)| b);
                self.bucket.put(&format!("{base}.json"), map.as_bytes());
                self.bucket.put(&format!("{base}.svg"), art.as_bytes());
                Ok(())
            }
            GenBehavior::Nothing => Ok(()),
            GenBehavior::Fail => Err(GenerateError("INTERNAL: Failed to Execute".into())),
        }
    }
}

#[derive(Default)]
pub struct ClockState {
    pub now: Cell<f64>,
    pub slept: RefCell<Vec<u32>>,
}

pub struct TestClock(pub Rc<ClockState>);

impl Clock for TestClock {
    fn now_ms(&self) -> f64 {
        self.0.now.get()
    }

    async fn sleep(&self, ms: u32) {
        self.0.slept.borrow_mut().push(ms);
        self.0.now.set(self.0.now.get() + f64::from(ms));
    }
}

pub struct FakeAssets {
    pub pictures: HashMap<String, RawAsset>,
    pub clock: Rc<ClockState>,
    /// Simulated load time.
    pub cost_ms: f64,
}

impl LocalAssets for FakeAssets {
    async fn load(&self, name: &str) -> Result<RawAsset, TransportError> {
        self.clock.now.set(self.clock.now.get() + self.cost_ms);
        self.pictures
            .get(name)
            .cloned()
            .ok_or_else(|| TransportError::new(format!("no bundled picture {name}")))
    }
}

pub type TestResolver = AssetResolver<FakeAssets, MemStore, FakeGenerator, TestClock>;

pub struct Harness {
    pub bucket: Rc<Bucket>,
    pub clock: Rc<ClockState>,
    pub calls: Rc<Cell<usize>>,
    pub hook: Rc<RefCell<Option<Box<dyn Fn()>>>>,
}

impl Harness {
    pub fn new() -> Self {
        Harness {
            bucket: Rc::new(Bucket::default()),
            clock: Rc::new(ClockState::default()),
            calls: Rc::new(Cell::new(0)),
            hook: Rc::new(RefCell::new(None)),
        }
    }

    pub fn resolver(&self, behavior: GenBehavior, cost_ms: f64) -> TestResolver {
        let mut pictures = HashMap::new();
        pictures.insert(
            "panda".to_string(),
            RawAsset {
                map: MAP_JSON.as_bytes().to_vec(),
                art: ART_SVG.as_bytes().to_vec(),
            },
        );
        pictures.insert(
            "flower".to_string(),
            RawAsset {
                map: OTHER_MAP_JSON.as_bytes().to_vec(),
                art: OTHER_ART_SVG.as_bytes().to_vec(),
            },
        );
        AssetResolver::new(
            FakeAssets {
                pictures,
                clock: self.clock.clone(),
                cost_ms,
            },
            MemStore(self.bucket.clone()),
            FakeGenerator {
                bucket: self.bucket.clone(),
                behavior,
                calls: self.calls.clone(),
                hook: self.hook.clone(),
            },
            TestClock(self.clock.clone()),
            ResolverConfig::default(),
        )
    }

    pub fn populated() -> GenBehavior {
        GenBehavior::Populate(MAP_JSON.to_string(), ART_SVG.to_string())
    }
}
