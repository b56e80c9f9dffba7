//! Well-known names registered at fixed ids when a table is built.

use rustc_hash::FxHashSet;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumCount as EnumCountMacro, EnumIter, IntoStaticStr};

use crate::entry::{case_insensitive_hash, fold_char, CaseMode};
use crate::name::NameEntryId;
use crate::table::NameTable;

/// Each variant's discriminant is the entry id its text is registered at.
///
/// The list is append-only: reordering would change the ids of existing names.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, IntoStaticStr, EnumIter, EnumCountMacro,
)]
#[repr(u32)]
pub enum EName {
    None = 0,

    // property types
    ByteProperty,
    IntProperty,
    BoolProperty,
    FloatProperty,
    ObjectProperty,
    NameProperty,
    DelegateProperty,
    DoubleProperty,
    ArrayProperty,
    StructProperty,
    VectorProperty,
    RotatorProperty,
    StrProperty,
    TextProperty,
    InterfaceProperty,
    MulticastDelegateProperty,
    LazyObjectProperty,
    SoftObjectProperty,
    UInt64Property,
    UInt32Property,
    UInt16Property,
    Int64Property,
    Int16Property,
    Int8Property,
    MapProperty,
    SetProperty,
    EnumProperty,

    // packages
    Core,
    Engine,
    Editor,
    CoreUObject,

    // math and struct types
    Cylinder,
    BoxSphereBounds,
    Sphere,
    Box,
    Vector2D,
    IntRect,
    IntPoint,
    Vector4,
    Name,
    Vector,
    Rotator,
    SHVector,
    Color,
    Plane,
    Matrix,
    LinearColor,
    AdvanceFrame,
    Pointer,
    Double,
    Quat,
    #[strum(serialize = "Self")]
    SelfName,
    Transform,

    // object model
    Object,
    Camera,
    Actor,
    ObjectRedirector,
    ActorDestroyed,
    Class,
    Function,
    Package,
    Struct,
    State,
    Enum,
    Field,
    Property,
    Tick,
    Timer,

    // events and states
    Begin,
    End,
    Default,
    Skip,
    Input,
    Init,
    Exit,
    Main,
    Spawned,
    Destroyed,
    Touch,
    UnTouch,
    Bump,
}

impl EName {
    pub const fn entry_id(self) -> NameEntryId {
        NameEntryId::from_raw(self as u32)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// The well-known name registered at `id`, if any.
    pub fn from_entry_id(id: NameEntryId) -> Option<EName> {
        EName::iter().nth(id.raw() as usize)
    }
}

/// The text of every [`EName`], in id order.
pub(crate) fn bootstrap_names() -> Vec<&'static str> {
    EName::iter().map(EName::as_str).collect()
}

/// Registers `names` at ids `0..names.len()`. Must run before the table is
/// shared; a name that is already present is fatal.
pub(crate) fn register_bootstrap_names(table: &NameTable, names: &[&'static str]) {
    for (idx, &text) in names.iter().enumerate() {
        let (id, inserted) = table.find_or_insert_reporting(
            text,
            case_insensitive_hash(text),
            CaseMode::Insensitive,
        );

        assert!(
            inserted,
            "bootstrap name '{text}' collides with '{}'",
            table.entry(id).map(|e| e.as_str()).unwrap_or("?")
        );
        assert_eq!(
            id.index(),
            idx,
            "bootstrap name '{text}' registered at the wrong id"
        );
    }

    if cfg!(debug_assertions) {
        verify_bootstrap_unique(table, names.len());
    }

    tracing::debug!(count = names.len(), "registered bootstrap names");
}

/// Fails if two of the first `count` entries share a bucket and differ only in case.
fn verify_bootstrap_unique(table: &NameTable, count: usize) {
    for bucket in 0..table.comparison_bucket_count() {
        let chain = table
            .comparison_chain(bucket)
            .filter(|id| id.index() < count)
            .map(|id| match table.entry(id) {
                Some(entry) => entry.as_str(),
                None => panic!("bootstrap entry {id} vanished"),
            });

        if let Some(dup) = first_case_duplicate(chain) {
            panic!("bootstrap name '{dup}' duplicates another bootstrap name");
        }
    }
}

fn first_case_duplicate<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = FxHashSet::default();
    names.find(|name| !seen.insert(name.chars().map(fold_char).collect::<String>()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::EnumCount;
    use crate::config::NameTableConfig;
    use crate::name::Name;

    #[test]
    fn registered_in_order_from_zero() {
        let table = NameTable::default();

        assert_eq!(table.len(), EName::COUNT);
        for ename in EName::iter() {
            let entry = table.entry(ename.entry_id()).unwrap();
            assert_eq!(entry.as_str(), ename.as_str());
        }

        assert_eq!(table.entry(NameEntryId::NONE).unwrap().as_str(), "None");
        assert_eq!(EName::SelfName.as_str(), "Self");
    }

    #[test]
    fn lookups_hit_bootstrap_ids() {
        let table = NameTable::default();

        assert_eq!(table.name("Actor"), Name::from(EName::Actor));
        assert_eq!(table.name("actor"), EName::Actor);
        assert_eq!(table.name("None"), Name::NONE);
        assert_eq!(table.name("Vector_3"), Name::from(EName::Vector).with_number(4));
    }

    #[test]
    fn from_entry_id_inverts_entry_id() {
        assert_eq!(EName::from_entry_id(EName::Bump.entry_id()), Some(EName::Bump));
        assert_eq!(EName::from_entry_id(NameEntryId::from_raw(EName::COUNT as u32)), None);
    }

    #[test]
    fn bootstrap_survives_tiny_bucket_tables() {
        // everything lands in one chain, the uniqueness pass must still pass
        let table = NameTable::new(NameTableConfig::default().with_buckets(1)).unwrap();
        assert_eq!(table.len(), EName::COUNT);
        verify_bootstrap_unique(&table, EName::COUNT);
    }

    #[test]
    fn custom_bootstrap_lists_get_consecutive_ids() {
        let table =
            NameTable::with_bootstrap(NameTableConfig::default(), &["None", "Alpha", "Beta"]).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.find("beta").comparison_id(), NameEntryId::from_raw(2));
    }

    #[test]
    #[should_panic(expected = "collides")]
    fn bootstrap_names_differing_in_case_are_fatal() {
        let _ = NameTable::with_bootstrap(NameTableConfig::default(), &["None", "Foo", "FOO"]);
    }

    #[test]
    fn case_duplicates_are_detected() {
        assert_eq!(first_case_duplicate(["Foo", "Bar", "FOO"].into_iter()), Some("FOO"));
        assert_eq!(first_case_duplicate(["Größe", "GRÖßE"].into_iter()), Some("GRÖßE"));
        assert_eq!(first_case_duplicate(["Foo", "Food"].into_iter()), None);
    }
}
