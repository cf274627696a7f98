//! Class descriptions shared by the unit tests.
//!
//! The Bonk classes describe the same two-field schema (`1: message`,
//! `2: type`) once per construction idiom.

use crate::class::{
    ClassInfo, ClassSet, ConstructorInfo, FieldInfo, FieldTag, MethodInfo, ParameterInfo, TypeRef,
};

pub(crate) const BONK_BUILDER_CLASS: &str = "BonkBuilder.Builder";

fn getters(class: ClassInfo) -> ClassInfo {
    class
        .method(MethodInfo::getter("getMessage", TypeRef::String, FieldTag::id(1)))
        .method(MethodInfo::getter("getType", TypeRef::I32, FieldTag::id(2)))
}

/// Mutable fields plus a no-argument constructor
pub(crate) fn bonk_field() -> ClassInfo {
    ClassInfo::new("BonkField")
        .field(FieldInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)))
        .field(FieldInfo::new("type", TypeRef::I32).tagged(FieldTag::id(2)))
        .constructor(ConstructorInfo::no_args())
}

/// All-arguments constructor plus accessors
pub(crate) fn bonk_constructor() -> ClassInfo {
    getters(ClassInfo::new("BonkConstructor")).constructor(ConstructorInfo::with_parameters(vec![
        ParameterInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)),
        ParameterInfo::new("type", TypeRef::I32).tagged(FieldTag::id(2)),
    ]))
}

/// No-argument constructor, setters and accessors
pub(crate) fn bonk_method() -> ClassInfo {
    getters(ClassInfo::new("BonkMethod"))
        .constructor(ConstructorInfo::no_args())
        .method(MethodInfo::setter("setMessage", TypeRef::String, FieldTag::id(1)))
        .method(MethodInfo::setter("setType", TypeRef::I32, FieldTag::id(2)))
}

/// Accessors only; instances come from [`bonk_builder_class`]
pub(crate) fn bonk_builder() -> ClassInfo {
    getters(ClassInfo::new("BonkBuilder")).builder(BONK_BUILDER_CLASS)
}

pub(crate) fn bonk_builder_class() -> ClassInfo {
    let returns_builder = TypeRef::structure(BONK_BUILDER_CLASS);
    ClassInfo::new(BONK_BUILDER_CLASS)
        .constructor(ConstructorInfo::no_args())
        .method(
            MethodInfo::setter("setMessage", TypeRef::String, FieldTag::id(1)).returns(returns_builder.clone()),
        )
        .method(MethodInfo::setter("setType", TypeRef::I32, FieldTag::id(2)).returns(returns_builder))
        .method(MethodInfo::new("build").returns(TypeRef::structure("BonkBuilder")).factory())
}

/// One untagged method whose parameters are both tagged
pub(crate) fn bonk_multi_setter() -> ClassInfo {
    getters(ClassInfo::new("BonkMultiSetter"))
        .constructor(ConstructorInfo::no_args())
        .method(
            MethodInfo::new("setData")
                .parameter(ParameterInfo::new("message", TypeRef::String).tagged(FieldTag::id(1)))
                .parameter(ParameterInfo::new("type", TypeRef::I32).tagged(FieldTag::id(2))),
        )
}

/// A tree node whose `child` field has the node's own type
pub(crate) fn tree_node() -> ClassInfo {
    ClassInfo::new("Node")
        .field(FieldInfo::new("value", TypeRef::I32).tagged(FieldTag::id(1)))
        .field(FieldInfo::new("child", TypeRef::structure("Node")).tagged(FieldTag::id(2)))
        .constructor(ConstructorInfo::no_args())
}

/// Every fixture above in one set
pub(crate) fn bonk_classes() -> ClassSet {
    let classes = [
        bonk_field(),
        bonk_constructor(),
        bonk_method(),
        bonk_builder(),
        bonk_builder_class(),
        bonk_multi_setter(),
        tree_node(),
    ];
    ClassSet::from_classes(classes).expect("fixture class names are unique")
}
