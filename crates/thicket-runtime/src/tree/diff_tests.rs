use crate::test_utils::{module_language, parse};
use crate::{InputEdit, Parser, Range, Tree};

fn spans(ranges: &[Range]) -> Vec<std::ops::Range<usize>> {
    ranges.iter().map(Range::bytes).collect()
}

#[test]
fn a_tree_has_no_changes_against_itself() {
    let language = module_language();
    let tree = parse(&language, "module M { a b }");
    assert!(Tree::changed_ranges(&tree, &tree).is_empty());
    assert!(Tree::changed_ranges(&tree, &tree.clone()).is_empty());
}

#[test]
fn edited_spans_are_reported_without_a_reparse() {
    let language = module_language();
    let text = "module M { }";
    let tree = parse(&language, text);
    let edited = tree.edit(&InputEdit::insert(text.as_bytes(), 9, b"x ")).unwrap();
    assert_eq!(spans(&Tree::changed_ranges(&edited, &edited)), vec![9..11]);
}

#[test]
fn one_renamed_word_in_a_long_block() {
    let language = module_language();
    let words: Vec<String> = (0..500).map(|i| format!("w{i}")).collect();
    let text = format!("module M {{ {} }}", words.join(" "));
    let tree = parse(&language, &text);

    let at = text.find("w250 ").unwrap();
    let new_text = format!("{}zz{}", &text[..at], &text[at + 4..]);
    let edited = tree
        .edit(&InputEdit::replace(text.as_bytes(), at..at + 4, b"zz"))
        .unwrap();
    let mut parser = Parser::new(&language).unwrap();
    let (new_tree, ranges) = parser.reparse(&edited, new_text.as_str()).unwrap();

    assert_eq!(spans(&ranges), vec![at..at + 2]);
    assert_eq!(new_tree.root_node().to_sexp(), tree.root_node().to_sexp());
}
