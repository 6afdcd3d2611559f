//! The node schema table.
//!
//! One table describes every node kind the parser module can emit: its tag,
//! its ESTree name and the exact order and shape of its fields. The decoder
//! and the test encoder both read this table, so a kind is added in exactly
//! one place. Tags are 1-based table positions; tag 0 encodes an absent node.
//!
//! Changing the order of existing entries changes the wire format and must
//! bump [`SCHEMA_VERSION`].

use std::fmt;

/// Version of the program-buffer layout this table describes.
pub const SCHEMA_VERSION: u32 = 1;

/// Shape of a single field in the program buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A single, possibly absent, child node.
    Node,
    /// A count-prefixed sequence of possibly absent child nodes.
    NodeList,
    /// An out-of-line, possibly absent, UTF-8 string.
    String,
    /// An 8-byte aligned double.
    Number,
    /// A 0/1 word.
    Boolean,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSchema {
    pub kind: NodeKind,
    pub name: &'static str,
    pub fields: &'static [FieldSchema],
}

macro_rules! node_kinds {
    ($( $kind:ident { $( $field:literal : $shape:ident ),* $(,)? } ),* $(,)?) => {
        /// Every node kind in the schema, in tag order.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum NodeKind {
            $( $kind, )*
        }

        /// Schema entries indexed by `tag - 1`.
        pub static NODE_SCHEMAS: &[NodeSchema] = &[
            $(
                NodeSchema {
                    kind: NodeKind::$kind,
                    name: stringify!($kind),
                    fields: &[ $( FieldSchema { name: $field, kind: FieldKind::$shape } ),* ],
                },
            )*
        ];
    };
}

node_kinds! {
    Program { "body": NodeList },

    Identifier { "name": String, "typeAnnotation": Node, "optional": Boolean },
    PrivateIdentifier { "name": String },

    NullLiteral {},
    BooleanLiteral { "value": Boolean, "raw": String },
    NumericLiteral { "value": Number, "raw": String },
    StringLiteral { "value": String, "raw": String },
    BigIntLiteral { "bigint": String, "raw": String },
    RegExpLiteral { "pattern": String, "flags": String },
    TemplateLiteral { "quasis": NodeList, "expressions": NodeList },
    TemplateElement { "tail": Boolean, "cooked": String, "raw": String },
    TaggedTemplateExpression { "tag": Node, "quasi": Node },

    ThisExpression {},
    Super {},
    ArrayExpression { "elements": NodeList, "trailingComma": Boolean },
    ObjectExpression { "properties": NodeList },
    Property { "key": Node, "value": Node, "kind": String, "computed": Boolean, "method": Boolean, "shorthand": Boolean },
    SpreadElement { "argument": Node },
    FunctionExpression { "id": Node, "params": NodeList, "body": Node, "typeParameters": Node, "returnType": Node, "generator": Boolean, "async": Boolean },
    ArrowFunctionExpression { "id": Node, "params": NodeList, "body": Node, "typeParameters": Node, "returnType": Node, "expression": Boolean, "async": Boolean },
    ClassExpression { "id": Node, "superClass": Node, "body": Node },
    UnaryExpression { "operator": String, "argument": Node, "prefix": Boolean },
    UpdateExpression { "operator": String, "argument": Node, "prefix": Boolean },
    BinaryExpression { "left": Node, "right": Node, "operator": String },
    LogicalExpression { "left": Node, "right": Node, "operator": String },
    AssignmentExpression { "operator": String, "left": Node, "right": Node },
    ConditionalExpression { "test": Node, "alternate": Node, "consequent": Node },
    CallExpression { "callee": Node, "typeArguments": Node, "arguments": NodeList },
    OptionalCallExpression { "callee": Node, "typeArguments": Node, "arguments": NodeList, "optional": Boolean },
    NewExpression { "callee": Node, "typeArguments": Node, "arguments": NodeList },
    MemberExpression { "object": Node, "property": Node, "computed": Boolean },
    OptionalMemberExpression { "object": Node, "property": Node, "computed": Boolean, "optional": Boolean },
    SequenceExpression { "expressions": NodeList },
    YieldExpression { "argument": Node, "delegate": Boolean },
    AwaitExpression { "argument": Node },
    ImportExpression { "source": Node, "attributes": Node },
    MetaProperty { "meta": Node, "property": Node },

    ExpressionStatement { "expression": Node, "directive": String },
    BlockStatement { "body": NodeList },
    EmptyStatement {},
    DebuggerStatement {},
    ReturnStatement { "argument": Node },
    IfStatement { "test": Node, "consequent": Node, "alternate": Node },
    ForStatement { "init": Node, "test": Node, "update": Node, "body": Node },
    ForInStatement { "left": Node, "right": Node, "body": Node },
    ForOfStatement { "left": Node, "right": Node, "body": Node, "await": Boolean },
    WhileStatement { "body": Node, "test": Node },
    DoWhileStatement { "body": Node, "test": Node },
    BreakStatement { "label": Node },
    ContinueStatement { "label": Node },
    ThrowStatement { "argument": Node },
    TryStatement { "block": Node, "handler": Node, "finalizer": Node },
    CatchClause { "param": Node, "body": Node },
    SwitchStatement { "discriminant": Node, "cases": NodeList },
    SwitchCase { "test": Node, "consequent": NodeList },
    LabeledStatement { "label": Node, "body": Node },

    VariableDeclaration { "kind": String, "declarations": NodeList },
    VariableDeclarator { "init": Node, "id": Node },
    FunctionDeclaration { "id": Node, "params": NodeList, "body": Node, "typeParameters": Node, "returnType": Node, "generator": Boolean, "async": Boolean },
    ClassDeclaration { "id": Node, "superClass": Node, "body": Node },
    ClassBody { "body": NodeList },
    MethodDefinition { "key": Node, "value": Node, "kind": String, "computed": Boolean, "static": Boolean },
    PropertyDefinition { "key": Node, "value": Node, "computed": Boolean, "static": Boolean, "declare": Boolean, "optional": Boolean, "typeAnnotation": Node },

    ObjectPattern { "properties": NodeList, "typeAnnotation": Node },
    ArrayPattern { "elements": NodeList, "typeAnnotation": Node },
    RestElement { "argument": Node },
    AssignmentPattern { "left": Node, "right": Node },

    ImportDeclaration { "specifiers": NodeList, "source": Node, "attributes": NodeList, "importKind": String },
    ImportSpecifier { "imported": Node, "local": Node, "importKind": String },
    ImportDefaultSpecifier { "local": Node },
    ImportNamespaceSpecifier { "local": Node },
    ExportNamedDeclaration { "declaration": Node, "specifiers": NodeList, "source": Node, "exportKind": String },
    ExportDefaultDeclaration { "declaration": Node },
    ExportAllDeclaration { "exported": Node, "source": Node, "exportKind": String },
    ExportSpecifier { "exported": Node, "local": Node },

    JSXElement { "openingElement": Node, "children": NodeList, "closingElement": Node },
    JSXOpeningElement { "name": Node, "attributes": NodeList, "selfClosing": Boolean, "typeArguments": Node },
    JSXClosingElement { "name": Node },
    JSXAttribute { "name": Node, "value": Node },
    JSXIdentifier { "name": String },
    JSXText { "value": String, "raw": String },
    JSXExpressionContainer { "expression": Node },
    JSXEmptyExpression {},
    JSXFragment { "openingFragment": Node, "children": NodeList, "closingFragment": Node },
    JSXOpeningFragment {},
    JSXClosingFragment {},

    TypeAnnotation { "typeAnnotation": Node },
    TypeParameterDeclaration { "params": NodeList },
    TypeParameter { "name": String, "bound": Node, "variance": Node, "default": Node },
    TypeParameterInstantiation { "params": NodeList },
    AnyTypeAnnotation {},
    NumberTypeAnnotation {},
    StringTypeAnnotation {},
    BooleanTypeAnnotation {},
    VoidTypeAnnotation {},
    NullableTypeAnnotation { "typeAnnotation": Node },
    GenericTypeAnnotation { "id": Node, "typeParameters": Node },
    TypeAlias { "id": Node, "typeParameters": Node, "right": Node },
    TypeCastExpression { "expression": Node, "typeAnnotation": Node },

    ComponentDeclaration { "id": Node, "params": NodeList, "body": Node, "typeParameters": Node, "rendersType": Node },
    ComponentParameter { "name": Node, "local": Node, "shorthand": Boolean },
    MatchExpression { "argument": Node, "cases": NodeList },
    MatchExpressionCase { "pattern": Node, "body": Node, "guard": Node },
    MatchWildcardPattern {},
}

impl NodeKind {
    /// Look up the schema entry for a wire tag. Tag 0 (absent) and tags past
    /// the end of the table yield `None`.
    pub fn schema_for_tag(tag: u32) -> Option<&'static NodeSchema> {
        let index = tag.checked_sub(1)?;
        NODE_SCHEMAS.get(index as usize)
    }

    pub fn from_tag(tag: u32) -> Option<NodeKind> {
        Self::schema_for_tag(tag).map(|schema| schema.kind)
    }

    /// Look up a kind by its ESTree name.
    pub fn from_name(name: &str) -> Option<NodeKind> {
        NODE_SCHEMAS
            .iter()
            .find(|schema| schema.name == name)
            .map(|schema| schema.kind)
    }

    /// The wire tag for this kind.
    pub fn tag(self) -> u32 {
        self as u32 + 1
    }

    pub fn schema(self) -> &'static NodeSchema {
        &NODE_SCHEMAS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.schema().name
    }

    pub fn fields(self) -> &'static [FieldSchema] {
        self.schema().fields
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
