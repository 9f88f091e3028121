//! End-to-end rendering of whole queries.

mod common;

use common::{render, text};
use wink_sql_builder::{
    ConditionBuilder, Direction, Field, Limit, Logic, QueryBuilder, SqlValue, Sqlifiable,
};

#[test]
fn join_on_column_comparison_binds_nothing() {
    let mut on = ConditionBuilder::on();
    on.equal("u.roleId", Field::parse("r.id"));

    let mut query = QueryBuilder::new();
    query
        .from("user", Some("u"))
        .select(["u.id", "u.name"])
        .inner_join("role", Some("r"), on);

    let (sql, values) = render(&query);
    assert_eq!(
        sql,
        "select `u`.`id`, `u`.`name` from `user` as `u` inner join `role` as `r` on `u`.`role_id` = `r`.`id`"
    );
    assert!(values.is_empty());
}

#[test]
fn or_scope_with_pattern_operators() {
    let mut conditions = ConditionBuilder::where_clause();
    conditions.or().like("name", "文").starts_with("name", "向");

    let (sql, values) = render(&conditions);
    assert_eq!(
        sql,
        "where `name` like concat('%',?,'%') or `name` like concat(?,'%')"
    );
    assert_eq!(values, vec![text("文"), text("向")]);
}

#[test]
fn page_window() {
    let (sql, values) = render(&Limit::page(2, 10));
    assert_eq!(sql, "limit ?,?");
    assert_eq!(values, vec![SqlValue::Int(10), SqlValue::Int(20)]);
}

#[test]
fn from_twice_keeps_one_primary_table() {
    let mut query = QueryBuilder::new();
    query
        .from("a", None)
        .left_join("c", None, ConditionBuilder::on())
        .from("b", None);
    assert_eq!(query.to_sql(), "select * from `b` left outer join `c`");
}

#[test]
fn every_join_keyword() {
    let mut query = QueryBuilder::new();
    query
        .from("a", None)
        .inner_join("b", None, ConditionBuilder::on())
        .left_join("c", None, ConditionBuilder::on())
        .right_join("d", None, ConditionBuilder::on())
        .full_join("e", None, ConditionBuilder::on());
    assert_eq!(
        query.to_sql(),
        "select * from `a` inner join `b` left outer join `c` right outer join `d` full outer join `e`"
    );
}

#[test]
fn nested_groups_and_conditional_filters() {
    let keyword = Some("tom");
    let role_ids: Vec<i64> = vec![];

    let mut query = QueryBuilder::new();
    query
        .from("user", None)
        .equal("status", 1)
        .like_if("name", keyword.unwrap_or_default(), || keyword.is_some())
        .in_list_if("role_id", role_ids.clone(), || !role_ids.is_empty());
    query.or().lt("age", 18).gt("age", 60);
    query.order_by("createTime", Direction::Desc).page(3, 5);

    let (sql, values) = render(&query);
    assert_eq!(
        sql,
        "select * from `user` where `status` = ? and `name` like concat('%',?,'%') \
         and (`age` < ? or `age` > ?) order by `create_time` desc limit ?,?"
    );
    assert_eq!(
        values,
        vec![
            SqlValue::Int(1),
            text("tom"),
            SqlValue::Int(18),
            SqlValue::Int(60),
            SqlValue::Int(10),
            SqlValue::Int(15),
        ]
    );
}

#[test]
fn subquery_values_flow_in_order() {
    let mut sub = QueryBuilder::new();
    sub.select(["user_id"])
        .from("user_role", None)
        .in_list("role_id", [3, 4]);

    let mut query = QueryBuilder::new();
    query
        .from("user", None)
        .equal("status", 1)
        .in_query("id", sub)
        .between("age", 20, 30);

    let (sql, values) = render(&query);
    assert_eq!(
        sql,
        "select * from `user` where `status` = ? and `id` in \
         (select `user_id` from `user_role` where `role_id` in (?, ?)) and `age` between ? and ?"
    );
    assert_eq!(
        values,
        vec![
            SqlValue::Int(1),
            SqlValue::Int(3),
            SqlValue::Int(4),
            SqlValue::Int(20),
            SqlValue::Int(30),
        ]
    );
}

#[test]
fn group_by_having() {
    let mut having = ConditionBuilder::having();
    having.gte("count(1)", 2);

    let mut query = QueryBuilder::new();
    query
        .select(["role_id", "count(1) as total"])
        .from("user", None)
        .group_by("role_id")
        .having(having);

    let (sql, values) = render(&query);
    assert_eq!(
        sql,
        "select `role_id`, count(1) as `total` from `user` group by `role_id` having count(1) >= ?"
    );
    assert_eq!(values, vec![SqlValue::Int(2)]);
}

#[test]
fn explicit_nested_group() {
    let mut group = ConditionBuilder::nested(Logic::Or);
    group.is_null("deleted_at").equal("del_flag", 0);

    let mut conditions = ConditionBuilder::where_clause();
    conditions.equal("id", 1).push_group(group);
    assert_eq!(
        conditions.to_sql(),
        "where `id` = ? and (`deleted_at` is null or `del_flag` = ?)"
    );
}

#[test]
fn match_with_single_character_wildcard() {
    let mut query = QueryBuilder::new();
    query.from("dict", None).matches("code", "concat('A_', ?)", "1");
    let (sql, values) = render(&query);
    assert_eq!(sql, "select * from `dict` where `code` like concat('A_', ?)");
    assert_eq!(values, vec![text("1")]);
}
