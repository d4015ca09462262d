use marketplace_index::command::{strip_quotes, tokenize, CommandKind, CommandShell};
use marketplace_index::Marketplace;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A shell whose clock ticks one second per listing created.
fn shell() -> CommandShell {
    let tick = AtomicU32::new(0);
    CommandShell::with_clock(
        Arc::new(Marketplace::new()),
        Box::new(move || {
            let second = tick.fetch_add(1, Ordering::Relaxed);
            format!("2019-02-22 12:34:{second:02}")
        }),
    )
}

fn run(shell: &CommandShell, line: &str) -> String {
    shell.execute_line(line).unwrap_or_default()
}

#[test]
/// Test a full session exercising every command.
fn test_sample_session() {
    let shell = shell();

    assert_eq!(run(&shell, "REGISTER user1"), "Success");
    assert_eq!(run(&shell, "REGISTER user1"), "Error - user already existing");
    assert_eq!(
        run(
            &shell,
            "CREATE_LISTING user1 'Phone model 8' 'Black color, brand new' 1000 'Electronics'"
        ),
        "100001"
    );
    assert_eq!(run(&shell, "GET_LISTING user3 100001"), "Error - unknown user");
    assert_eq!(
        run(&shell, "GET_LISTING user1 100001"),
        "Phone model 8|Black color, brand new|1000|2019-02-22 12:34:00|Electronics|user1"
    );

    assert_eq!(
        run(&shell, "CREATE_LISTING user1 'Black shoes' 'Training shoes' 100 'Sports'"),
        "100002"
    );
    assert_eq!(run(&shell, "REGISTER user2"), "Success");
    assert_eq!(run(&shell, "REGISTER user3"), "Success");
    assert_eq!(
        run(&shell, "CREATE_LISTING user2 'T-shirt' 'White color' 20 'Sports'"),
        "100003"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING user3 'Sound bar' 'Good sound quality' 300 'Electronics'"),
        "100004"
    );

    assert_eq!(
        run(&shell, "GET_CATEGORY user1 'Fashion' sort_time asc"),
        "Error - category not found"
    );
    assert_eq!(
        run(&shell, "GET_CATEGORY user1 'Sports' sort_time dsc"),
        "T-shirt|White color|20|2019-02-22 12:34:02|Sports|user2\n\
         Black shoes|Training shoes|100|2019-02-22 12:34:01|Sports|user1"
    );
    assert_eq!(
        run(&shell, "GET_CATEGORY user1 'Sports' sort_price dsc"),
        "Black shoes|Training shoes|100|2019-02-22 12:34:01|Sports|user1\n\
         T-shirt|White color|20|2019-02-22 12:34:02|Sports|user2"
    );
    assert_eq!(run(&shell, "GET_CATEGORY user4 'Sports' sort_price dsc"), "Error - unknown user");

    // Sports reached two listings first; Electronics only tied it
    assert_eq!(run(&shell, "GET_TOP_CATEGORY user1"), "Sports");

    assert_eq!(run(&shell, "DELETE_LISTING user1 100003"), "Error - listing owner mismatch");
    assert_eq!(run(&shell, "DELETE_LISTING user2 100003"), "Success");
    assert_eq!(run(&shell, "DELETE_LISTING user2 100003"), "Error - listing not found");
    assert_eq!(run(&shell, "GET_LISTING user1 100003"), "Error - not found");

    assert_eq!(run(&shell, "GET_TOP_CATEGORY user1"), "Electronics");
    assert_eq!(run(&shell, "DELETE_LISTING USER1 100001"), "Success", "Owners match ignoring case");
    assert_eq!(
        run(&shell, "GET_TOP_CATEGORY user1"),
        "Electronics",
        "Electronics fell into a 1-1 tie and keeps the lead"
    );
    assert_eq!(run(&shell, "DELETE_LISTING user3 100004"), "Success");
    assert_eq!(run(&shell, "GET_TOP_CATEGORY user1"), "Sports");
}

#[test]
/// Test that validation errors are reported before anything is stored.
fn test_create_listing_validation() {
    let shell = shell();
    run(&shell, "REGISTER seller");

    assert_eq!(run(&shell, "CREATE_LISTING seller 'Lamp' 'Desk'"), "Error - invalid arguments");
    assert_eq!(
        run(&shell, "CREATE_LISTING nobody 'Lamp' 'Desk' 10 'Home'"),
        "Error - unknown user"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING seller '' 'Desk' 10 'Home'"),
        "Error - empty title, description, or category"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING seller 'Lamp' '   ' 10 'Home'"),
        "Error - empty title, description, or category"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING seller 'Lamp' 'Desk' ten 'Home'"),
        "Error - invalid price format"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING seller 'Lamp' 'Desk' 0 'Home'"),
        "Error - price must be a positive value"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING seller 'Lamp' 'Desk' -5 'Home'"),
        "Error - price must be a positive value"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING seller 'Lamp' 'Desk' 0.00000000000000000000000000001 'Home'"),
        "Error - invalid price format",
        "A positive price too small to represent must not read as zero"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING seller 'Lamp' 'Desk' 1e-30 'Home'"),
        "Error - invalid price format"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING seller 'Lamp' 'Desk' 1_000 'Home'"),
        "Error - invalid price format",
        "Digit separators are not part of a price"
    );
    assert_eq!(
        run(&shell, "CREATE_LISTING seller 'Lamp' 'Desk' 1e30 'Home'"),
        "Error - invalid price format",
        "Prices beyond the representable range are rejected as malformed"
    );

    assert_eq!(run(&shell, "GET_TOP_CATEGORY seller"), "", "Nothing was stored");
    assert_eq!(run(&shell, "CREATE_LISTING seller 'Lamp' 'Desk' 10 'Home'"), "100001");
}

#[test]
/// Test that prices are rounded to whole numbers on output.
fn test_price_rounding() {
    let shell = shell();
    run(&shell, "REGISTER seller");
    run(&shell, "CREATE_LISTING seller 'Pen' 'Blue' 2.5 'Office'");
    run(&shell, "CREATE_LISTING seller 'Pad' 'Lined' 1e3 'Office'");

    assert_eq!(
        run(&shell, "GET_LISTING seller 100001"),
        "Pen|Blue|3|2019-02-22 12:34:00|Office|seller"
    );
    assert_eq!(
        run(&shell, "GET_LISTING seller 100002"),
        "Pad|Lined|1000|2019-02-22 12:34:01|Office|seller"
    );
}

#[test]
/// Test malformed ids, unknown commands and blank lines.
fn test_malformed_input() {
    let shell = shell();
    run(&shell, "REGISTER seller");

    assert_eq!(run(&shell, "GET_LISTING seller abc"), "Error - invalid listing id");
    assert_eq!(run(&shell, "DELETE_LISTING seller -1"), "Error - invalid listing id");
    assert_eq!(run(&shell, "GET_LISTING seller"), "Error - invalid arguments");
    assert_eq!(run(&shell, "REGISTER"), "Error - invalid arguments");
    assert_eq!(
        run(&shell, "REGISTER\tuser1"),
        "Error - unknown command",
        "A tab does not separate the keyword from its arguments"
    );
    assert_eq!(run(&shell, "FLY_TO_MOON seller"), "Error - unknown command");
    assert_eq!(shell.execute_line("   "), None, "Blank lines produce no output");
    assert_eq!(
        shell.execute_line("get_top_category seller"),
        None,
        "Keywords ignore case and an empty leader prints nothing"
    );
}

#[test]
/// Test tokenizing quoted arguments.
fn test_tokenizer() {
    assert_eq!(
        tokenize("  GET_CATEGORY  user1   'Home & Garden'  sort_time asc "),
        vec!["GET_CATEGORY", "user1", "'Home & Garden'", "sort_time", "asc"]
    );
    assert!(tokenize("").is_empty());

    assert_eq!(
        tokenize("REGISTER\tuser1  other"),
        vec!["REGISTER\tuser1", "other"],
        "Only spaces separate tokens"
    );

    assert_eq!(strip_quotes("'Home & Garden'"), "Home & Garden");
    assert_eq!(strip_quotes("plain"), "plain");
    assert_eq!(strip_quotes("''"), "");
}

#[test]
/// Test keyword lookup.
fn test_command_kind_parsing() {
    assert_eq!(CommandKind::parse("register"), Some(CommandKind::Register));
    assert_eq!(CommandKind::parse(" Get_Top_Category "), Some(CommandKind::GetTopCategory));
    assert_eq!(CommandKind::parse("DELETE"), None);
}
