//! Join strategy tests over graph pipelines.

mod support;

use rowgraph::{Bindings, Graph, Strategy};
use support::recs;

fn people() -> serde_json::Value {
    serde_json::json!([
        {"country_id": 1, "name": "John", "surname": "Black"},
        {"country_id": 1, "name": "Antony", "surname": "Brown"},
        {"country_id": 2, "name": "Alex", "surname": "Sidorov"},
        {"country_id": 4, "name": "Frodo", "surname": "Ivanov"},
        {"country_id": 4, "name": "Bilbo", "surname": "Beggins"},
        {"country_id": 4, "name": "Frank", "surname": "Sinatra"},
        {"country_id": 6, "name": "Xiao", "surname": "Hao"},
    ])
}

fn capitals() -> serde_json::Value {
    serde_json::json!([
        {"country_id": 2, "capital": "Moscow"},
        {"country_id": 4, "capital": "Fairytail"},
        {"country_id": 5, "capital": "New York"},
    ])
}

fn run(strategy: Strategy) -> Vec<rowgraph::Record> {
    let first = Graph::from_source("first_table");
    let second = Graph::from_source("second_table");
    first.join(&second, "country_id", strategy);
    first
        .run(
            Bindings::new()
                .records("first_table", recs(people()))
                .records("second_table", recs(capitals())),
        )
        .unwrap()
}

#[test]
fn left_join_fills_unmatched_rows_with_nulls() {
    assert_eq!(
        run(Strategy::Left),
        recs(serde_json::json!([
            {"country_id_left": 1, "name": "John", "surname": "Black", "country_id_right": null, "capital": null},
            {"country_id_left": 1, "name": "Antony", "surname": "Brown", "country_id_right": null, "capital": null},
            {"country_id_left": 2, "name": "Alex", "surname": "Sidorov", "country_id_right": 2, "capital": "Moscow"},
            {"country_id_left": 4, "name": "Frodo", "surname": "Ivanov", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 4, "name": "Bilbo", "surname": "Beggins", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 4, "name": "Frank", "surname": "Sinatra", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 6, "name": "Xiao", "surname": "Hao", "country_id_right": null, "capital": null},
        ]))
    );
}

#[test]
fn inner_join_keeps_matches_only() {
    assert_eq!(
        run(Strategy::Inner),
        recs(serde_json::json!([
            {"country_id_left": 2, "name": "Alex", "surname": "Sidorov", "country_id_right": 2, "capital": "Moscow"},
            {"country_id_left": 4, "name": "Frodo", "surname": "Ivanov", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 4, "name": "Bilbo", "surname": "Beggins", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 4, "name": "Frank", "surname": "Sinatra", "country_id_right": 4, "capital": "Fairytail"},
        ]))
    );
}

#[test]
fn right_join_appends_unmatched_right_rows() {
    assert_eq!(
        run(Strategy::Right),
        recs(serde_json::json!([
            {"country_id_left": 2, "name": "Alex", "surname": "Sidorov", "country_id_right": 2, "capital": "Moscow"},
            {"country_id_left": 4, "name": "Frodo", "surname": "Ivanov", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 4, "name": "Bilbo", "surname": "Beggins", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 4, "name": "Frank", "surname": "Sinatra", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": null, "name": null, "surname": null, "country_id_right": 5, "capital": "New York"},
        ]))
    );
}

#[test]
fn full_join_covers_both_sides() {
    assert_eq!(
        run(Strategy::Full),
        recs(serde_json::json!([
            {"country_id_left": 1, "name": "John", "surname": "Black", "country_id_right": null, "capital": null},
            {"country_id_left": 1, "name": "Antony", "surname": "Brown", "country_id_right": null, "capital": null},
            {"country_id_left": 2, "name": "Alex", "surname": "Sidorov", "country_id_right": 2, "capital": "Moscow"},
            {"country_id_left": 4, "name": "Frodo", "surname": "Ivanov", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 4, "name": "Bilbo", "surname": "Beggins", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 4, "name": "Frank", "surname": "Sinatra", "country_id_right": 4, "capital": "Fairytail"},
            {"country_id_left": 6, "name": "Xiao", "surname": "Hao", "country_id_right": null, "capital": null},
            {"country_id_left": null, "name": null, "surname": null, "country_id_right": 5, "capital": "New York"},
        ]))
    );
}

#[test]
fn swapping_sides_swaps_the_rename_direction() {
    let second = Graph::from_source("second_table");
    let first = Graph::from_source("first_table");
    second.join(&first, "country_id", Strategy::Left);

    let out = second
        .run(
            Bindings::new()
                .records("first_table", recs(people()))
                .records("second_table", recs(capitals())),
        )
        .unwrap();
    assert_eq!(
        out,
        recs(serde_json::json!([
            {"country_id_left": 2, "capital": "Moscow", "country_id_right": 2, "name": "Alex", "surname": "Sidorov"},
            {"country_id_left": 4, "capital": "Fairytail", "country_id_right": 4, "name": "Frodo", "surname": "Ivanov"},
            {"country_id_left": 4, "capital": "Fairytail", "country_id_right": 4, "name": "Bilbo", "surname": "Beggins"},
            {"country_id_left": 4, "capital": "Fairytail", "country_id_right": 4, "name": "Frank", "surname": "Sinatra"},
            {"country_id_left": 5, "capital": "New York", "country_id_right": null, "name": null, "surname": null},
        ]))
    );
}

#[test]
fn key_pair_with_distinct_names_keeps_both() {
    let mails = Graph::from_source("mails");
    let messages = Graph::from_source("messages");
    mails.join(&messages, ("id", "user_id"), Strategy::Inner);

    let out = mails
        .run(
            Bindings::new()
                .records(
                    "mails",
                    recs(serde_json::json!([
                        {"id": 1, "mail": "nsa@yandex.ru"},
                        {"id": 2, "mail": "sds@mail.ru"},
                    ])),
                )
                .records(
                    "messages",
                    recs(serde_json::json!([
                        {"user_id": 1, "message": "this is text"},
                        {"user_id": 3, "message": "some text"},
                        {"user_id": 1, "message": "hello"},
                        {"user_id": 2, "message": "some text"},
                        {"user_id": 4, "message": "wew"},
                        {"user_id": 2, "message": "pewpew"},
                    ])),
                ),
        )
        .unwrap();

    // Left-input order, ties in right-input order; no renaming since the
    // key names differ and no other field collides.
    assert_eq!(
        out,
        recs(serde_json::json!([
            {"id": 1, "mail": "nsa@yandex.ru", "user_id": 1, "message": "this is text"},
            {"id": 1, "mail": "nsa@yandex.ru", "user_id": 1, "message": "hello"},
            {"id": 2, "mail": "sds@mail.ru", "user_id": 2, "message": "some text"},
            {"id": 2, "mail": "sds@mail.ru", "user_id": 2, "message": "pewpew"},
        ]))
    );
}

#[test]
fn cross_join_is_the_cartesian_product() {
    let first = Graph::from_source("first_table");
    let second = Graph::from_source("second_table");
    first.cross_join(&second);

    let out = first
        .run(
            Bindings::new()
                .records(
                    "first_table",
                    recs(serde_json::json!([
                        {"country_id": 1, "name": "John"},
                        {"country_id": 2, "name": "Alex"},
                    ])),
                )
                .records(
                    "second_table",
                    recs(serde_json::json!([
                        {"capital": "Moscow", "description": "description text"},
                        {"capital": "Fairytail", "description": "some text"},
                    ])),
                ),
        )
        .unwrap();

    assert_eq!(
        out,
        recs(serde_json::json!([
            {"country_id": 1, "name": "John", "capital": "Moscow", "description": "description text"},
            {"country_id": 1, "name": "John", "capital": "Fairytail", "description": "some text"},
            {"country_id": 2, "name": "Alex", "capital": "Moscow", "description": "description text"},
            {"country_id": 2, "name": "Alex", "capital": "Fairytail", "description": "some text"},
        ]))
    );
}

#[test]
fn join_consumes_its_right_graph_under_the_same_bindings() {
    // The right side is itself a pipeline, not a bare source.
    let totals = Graph::from_source("orders");
    totals.sort("user");
    totals.reduce(
        |group: &mut rowgraph::GroupStream<'_>| {
            let mut user = rowgraph::Value::Null;
            let mut n = 0i64;
            for item in group.by_ref() {
                let record = item?;
                user = record.get("user").cloned().unwrap_or(rowgraph::Value::Null);
                n += 1;
            }
            Ok(vec![rowgraph::Record::new().with("user", user).with("orders", n)])
        },
        "user",
    );

    let users = Graph::from_source("users");
    users.join(&totals, ("name", "user"), Strategy::Left);

    let out = users
        .run(
            Bindings::new()
                .records(
                    "users",
                    recs(serde_json::json!([{"name": "ada"}, {"name": "bob"}])),
                )
                .records(
                    "orders",
                    recs(serde_json::json!([
                        {"user": "ada", "item": "x"},
                        {"user": "ada", "item": "y"},
                    ])),
                ),
        )
        .unwrap();

    assert_eq!(
        out,
        recs(serde_json::json!([
            {"name": "ada", "user": "ada", "orders": 2},
            {"name": "bob", "user": null, "orders": null},
        ]))
    );
}
