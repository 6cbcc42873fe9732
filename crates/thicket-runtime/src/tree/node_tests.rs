use indoc::indoc;

use crate::Point;
use crate::test_utils::{arithmetic_language, module_language, parse};

#[test]
fn module_structure() {
    let language = module_language();
    let text = "module M { a b }";
    let tree = parse(&language, text);
    let root = tree.root_node();

    insta::assert_snapshot!(root.to_sexp(), @"(module_definition name: (identifier) body: (block (identifier) (identifier)))");
    assert_eq!(root.kind(), "module_definition");
    assert!(root.is_named());
    assert!(!root.has_error());
    assert_eq!(root.byte_range(), 0..16);
    assert_eq!(root.child_count(), 3);
    assert_eq!(root.named_child_count(), 2);

    let keyword = root.child(0).unwrap();
    assert_eq!(keyword.kind(), "module");
    assert!(!keyword.is_named());
    assert_eq!(keyword.field_name(), None);

    let name = root.child_by_field_name("name").unwrap();
    assert_eq!(name.kind(), "identifier");
    assert_eq!(name.byte_range(), 7..8);
    assert_eq!(name.utf8_text(text), "M");
    assert_eq!(name.field_name(), Some("name"));
    assert_eq!(root.field_name_for_child(1), Some("name"));
    assert_eq!(root.field_name_for_child(2), Some("body"));

    let body = root.child_by_field_name("body").unwrap();
    assert_eq!(body.byte_range(), 9..16);
    assert_eq!(body.child_count(), 4);
    assert_eq!(root.children_by_field_name("body"), vec![body]);
    assert!(root.child_by_field_name("nowhere").is_none());
}

#[test]
fn navigation() {
    let language = module_language();
    let text = "module M { a b }";
    let tree = parse(&language, text);
    let root = tree.root_node();
    let body = root.child_by_field_name("body").unwrap();
    let a = body.named_child(0).unwrap();
    let b = body.named_child(1).unwrap();

    assert_eq!(a.utf8_text(text), "a");
    assert_eq!(a.parent(), Some(body));
    assert_eq!(body.parent(), Some(root));
    assert_eq!(root.parent(), None);
    assert_eq!(a.next_sibling(), Some(b));
    assert_eq!(b.prev_sibling(), Some(a));
    assert_eq!(a.next_named_sibling(), Some(b));
    assert_eq!(b.next_named_sibling(), None);
    assert_eq!(b.next_sibling().map(|n| n.kind()), Some("}"));
    assert_eq!(body.child(0).unwrap().prev_sibling(), None);
}

#[test]
fn descendants_by_byte_range() {
    let language = module_language();
    let tree = parse(&language, "module M { a b }");
    let root = tree.root_node();

    let a = root.descendant_for_byte_range(11, 12).unwrap();
    assert_eq!((a.kind(), a.start_byte()), ("identifier", 11));

    let brace = root.descendant_for_byte_range(9, 10).unwrap();
    assert_eq!(brace.kind(), "{");
    let named = root.named_descendant_for_byte_range(9, 10).unwrap();
    assert_eq!(named.kind(), "block");

    let spanning = root.descendant_for_byte_range(11, 14).unwrap();
    assert_eq!(spanning.kind(), "block");
    assert!(root.descendant_for_byte_range(3, 40).is_none());
}

#[test]
fn positions_across_lines() {
    let language = module_language();
    let text = indoc! {"
        module M {
          a
        }
    "};
    let tree = parse(&language, text);
    let body = tree.root_node().child_by_field_name("body").unwrap();
    let a = body.named_child(0).unwrap();
    assert_eq!(a.start_position(), Point::new(1, 2));
    assert_eq!(a.end_position(), Point::new(1, 3));
    assert_eq!(body.start_position(), Point::new(0, 9));
    assert_eq!(body.end_position(), Point::new(2, 1));
    assert_eq!(tree.len(), text.len());
}

#[test]
fn leading_whitespace_is_padding() {
    let language = module_language();
    let tree = parse(&language, "  module M {}\n");
    let root = tree.root_node();
    assert_eq!(root.start_byte(), 2);
    // trailing whitespace belongs to the root
    assert_eq!(root.end_byte(), 14);
    assert_eq!(root.child_by_field_name("body").unwrap().end_byte(), 13);
    assert_eq!(tree.len(), 14);
}

#[test]
fn comments_are_extra_children() {
    let language = module_language();
    let text = "module M { // inside\n a }";
    let tree = parse(&language, text);
    let body = tree.root_node().child_by_field_name("body").unwrap();
    let comment = body.named_child(0).unwrap();
    assert_eq!(comment.kind(), "comment");
    assert!(comment.is_extra());
    assert_eq!(comment.utf8_text(text), "// inside");
    insta::assert_snapshot!(tree.root_node().to_sexp(), @"(module_definition name: (identifier) body: (block (comment) (identifier)))");
}

#[test]
fn hidden_nodes_are_transparent() {
    let language = arithmetic_language(true);
    let text = "1 + 2 * 3";
    let tree = parse(&language, text);
    insta::assert_snapshot!(tree.root_node().to_sexp(), @"(program (expression left: (expression (number)) right: (expression left: (expression (number)) right: (expression (number)))))");

    let sum = tree.root_node().named_child(0).unwrap();
    let operator = sum.child_by_field_name("operator").unwrap();
    assert_eq!(operator.kind(), "+");
    assert!(!operator.is_named());
    let product = sum.child_by_field_name("right").unwrap();
    assert_eq!(product.utf8_text(text), "2 * 3");
}

#[test]
fn cursor_walks_depth_first() {
    let language = module_language();
    let tree = parse(&language, "module M { a }");
    let mut cursor = tree.walk();
    let mut visited = Vec::new();
    'walk: loop {
        let node = cursor.node();
        visited.push(format!(
            "{}{}{}",
            "  ".repeat(cursor.depth()),
            cursor.field_name().map(|f| format!("{f}: ")).unwrap_or_default(),
            node.kind()
        ));
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }
    insta::assert_snapshot!(visited.join("\n"), @r"
    module_definition
      module
      name: identifier
      body: block
        {
        identifier
        }
    ");
}

#[test]
fn cursor_jumps_to_byte() {
    let language = module_language();
    let tree = parse(&language, "module M { a }");
    let mut cursor = tree.walk();
    assert_eq!(cursor.goto_first_child_for_byte(8), Some(2));
    assert_eq!(cursor.node().kind(), "block");
    assert_eq!(cursor.depth(), 1);
    cursor.reset(tree.root_node());
    assert_eq!(cursor.depth(), 0);
    assert_eq!(cursor.goto_first_child_for_byte(100), None);
}

#[test]
fn cursor_steps_through_a_long_block() {
    let language = module_language();
    let count = 5_000;
    let text = format!("module M {{ {} }}", vec!["a"; count].join(" "));
    let tree = parse(&language, &text);
    let mut cursor = tree.walk();
    assert_eq!(cursor.goto_first_child_for_byte(9), Some(2));
    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().kind(), "{");

    let mut seen = 1;
    while cursor.goto_next_sibling() {
        seen += 1;
    }
    assert_eq!(seen, count + 2);
    assert_eq!(cursor.node().kind(), "}");
    assert!(cursor.goto_parent());
    assert_eq!(cursor.node().kind(), "block");
}

#[test]
fn debug_output() {
    let language = module_language();
    let tree = parse(&language, "module M {}");
    let name = tree.root_node().child(1).unwrap();
    insta::assert_snapshot!(format!("{tree:?}"), @"{Tree (module_definition name: (identifier) body: (block))}");
    insta::assert_snapshot!(format!("{name:?}"), @"{Node identifier (0:7) - (0:8)}");
}
