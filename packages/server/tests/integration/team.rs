use crate::common::{TestApp, routes};
use serde_json::json;

mod team_creation {
    use super::*;

    #[tokio::test]
    async fn qualified_user_can_create_a_team() {
        let app = TestApp::spawn().await;
        let (token, user_id) = app.create_qualified_user("lead@example.com", "Lead Dev").await;

        let res = app
            .post_with_token(
                routes::TEAM_CREATE,
                &json!({"competition_id": 7, "name": "Rustaceans"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["name"], "Rustaceans");
        assert_eq!(res.body["competition_id"], 7);
        assert_eq!(res.body["leader_id"].as_i64().unwrap() as i32, user_id);
        assert_eq!(res.body["is_locked"], false);
        assert_eq!(res.body["is_complete"], false);
    }

    #[tokio::test]
    async fn invite_code_is_sixteen_uppercase_hex_chars() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;

        let team = app.create_team(&token, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();

        assert_eq!(code.len(), 16);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn invite_codes_are_unique_across_teams() {
        let app = TestApp::spawn().await;

        let mut codes = std::collections::HashSet::new();
        for i in 0..5 {
            let (token, _) = app
                .create_qualified_user(&format!("lead{i}@example.com"), "Lead Dev")
                .await;
            let team = app.create_team(&token, 1, &format!("Team {i}")).await;
            assert!(codes.insert(team["invite_code"].as_str().unwrap().to_string()));
        }
    }

    #[tokio::test]
    async fn unqualified_user_cannot_create_a_team() {
        let app = TestApp::spawn().await;
        let (token, _) = app.register_user("newbie@example.com", "Newbie").await;

        let res = app
            .post_with_token(
                routes::TEAM_CREATE,
                &json!({"competition_id": 1, "name": "Nope"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn leader_cannot_create_second_team_in_same_competition() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        app.create_team(&token, 1, "First").await;

        let res = app
            .post_with_token(
                routes::TEAM_CREATE,
                &json!({"competition_id": 1, "name": "Second"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn same_leader_can_create_teams_in_different_competitions() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        app.create_team(&token, 1, "Spring Team").await;

        let res = app
            .post_with_token(
                routes::TEAM_CREATE,
                &json!({"competition_id": 2, "name": "Autumn Team"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 201);
    }

    #[tokio::test]
    async fn rejects_blank_team_name() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;

        let res = app
            .post_with_token(
                routes::TEAM_CREATE,
                &json!({"competition_id": 1, "name": "   "}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unauthenticated_user_cannot_create_a_team() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::TEAM_CREATE,
                &json!({"competition_id": 1, "name": "Nope"}),
            )
            .await;

        assert_eq!(res.status, 401);
    }
}

mod team_join {
    use super::*;

    #[tokio::test]
    async fn member_can_join_with_invite_code() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();

        let (member, _) = app.create_qualified_user("member@example.com", "Member").await;
        let res = app
            .post_with_token(routes::TEAM_JOIN, &json!({"invite_code": code}), &member)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["team"]["id"], team["id"]);
        assert_eq!(res.body["team"]["is_locked"], false);
    }

    #[tokio::test]
    async fn unknown_invite_code_returns_404() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_qualified_user("member@example.com", "Member").await;

        let res = app
            .post_with_token(
                routes::TEAM_JOIN,
                &json!({"invite_code": "0000000000000000"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn joining_twice_returns_conflict() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();

        let (member, _) = app.create_qualified_user("member@example.com", "Member").await;
        app.join_team(&member, code).await;

        let res = app
            .post_with_token(routes::TEAM_JOIN, &json!({"invite_code": code}), &member)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn leader_joining_own_team_returns_conflict() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();

        let res = app
            .post_with_token(routes::TEAM_JOIN, &json!({"invite_code": code}), &leader)
            .await;

        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn unqualified_user_cannot_join() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();

        let (member, _) = app.register_user("newbie@example.com", "Newbie").await;
        let res = app
            .post_with_token(routes::TEAM_JOIN, &json!({"invite_code": code}), &member)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn fifth_member_locks_and_completes_the_team() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();

        for i in 0..3 {
            let (member, _) = app
                .create_qualified_user(&format!("member{i}@example.com"), "Member")
                .await;
            let body = app.join_team(&member, code).await;
            assert_eq!(body["team"]["is_locked"], false);
        }

        let (last, _) = app.create_qualified_user("member3@example.com", "Member").await;
        let body = app.join_team(&last, code).await;

        assert_eq!(body["team"]["is_locked"], true);
        assert_eq!(body["team"]["is_complete"], true);
    }

    #[tokio::test]
    async fn locked_team_rejects_further_joins() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();

        for i in 0..4 {
            let (member, _) = app
                .create_qualified_user(&format!("member{i}@example.com"), "Member")
                .await;
            app.join_team(&member, code).await;
        }

        let (late, _) = app.create_qualified_user("late@example.com", "Late").await;
        let res = app
            .post_with_token(routes::TEAM_JOIN, &json!({"invite_code": code}), &late)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    /// Ten users race for the two remaining slots of a 3/5 team. The row
    /// lock on the team must let exactly two through.
    #[tokio::test]
    async fn concurrent_joins_never_overfill_the_team() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap().to_string();

        for i in 0..2 {
            let (member, _) = app
                .create_qualified_user(&format!("early{i}@example.com"), "Early")
                .await;
            app.join_team(&member, &code).await;
        }

        let mut tokens = Vec::new();
        for i in 0..10 {
            let (token, _) = app
                .create_qualified_user(&format!("racer{i}@example.com"), "Racer")
                .await;
            tokens.push(token);
        }

        let url = format!("http://{}{}", app.addr, routes::TEAM_JOIN);
        let mut tasks = Vec::new();
        for token in tokens {
            let client = app.client.clone();
            let url = url.clone();
            let body = json!({"invite_code": code});
            tasks.push(tokio::spawn(async move {
                client
                    .post(url)
                    .header("Authorization", format!("Bearer {token}"))
                    .json(&body)
                    .send()
                    .await
                    .expect("join request failed")
                    .status()
                    .as_u16()
            }));
        }

        let mut successes = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.expect("join task panicked") {
                200 => successes += 1,
                409 => conflicts += 1,
                other => panic!("unexpected join status {other}"),
            }
        }

        assert_eq!(successes, 2);
        assert_eq!(conflicts, 8);

        let res = app.get_with_token(routes::MY_TEAM, &leader).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["members"].as_array().unwrap().len(), 5);
        assert_eq!(res.body["is_locked"], true);
        assert_eq!(res.body["is_complete"], true);
    }
}

mod my_team {
    use super::*;

    #[tokio::test]
    async fn returns_team_with_roster_and_room() {
        let app = TestApp::spawn().await;
        let (leader, leader_id) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();

        let (member, member_id) = app.create_qualified_user("member@example.com", "Member").await;
        app.join_team(&member, code).await;

        let res = app.get_with_token(routes::MY_TEAM, &leader).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Rustaceans");
        assert_eq!(res.body["room"]["name"], "Rustaceans Room");

        let roster: Vec<i64> = res.body["members"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_i64().unwrap())
            .collect();
        assert_eq!(roster, vec![leader_id as i64, member_id as i64]);
    }

    #[tokio::test]
    async fn member_sees_the_same_team_as_leader() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();

        let (member, _) = app.create_qualified_user("member@example.com", "Member").await;
        app.join_team(&member, code).await;

        let res = app.get_with_token(routes::MY_TEAM, &member).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], team["id"]);
    }

    #[tokio::test]
    async fn user_without_team_gets_404() {
        let app = TestApp::spawn().await;
        let (token, _) = app.create_qualified_user("loner@example.com", "Loner").await;

        let res = app.get_with_token(routes::MY_TEAM, &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod team_leave {
    use super::*;

    #[tokio::test]
    async fn member_can_leave() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();
        let team_id = team["id"].as_i64().unwrap() as i32;

        let (member, _) = app.create_qualified_user("member@example.com", "Member").await;
        app.join_team(&member, code).await;

        let res = app
            .delete_with_token(&routes::team_leave(team_id), &member)
            .await;
        assert_eq!(res.status, 200);

        let res = app.get_with_token(routes::MY_TEAM, &member).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn leader_cannot_leave() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let team_id = team["id"].as_i64().unwrap() as i32;

        let res = app
            .delete_with_token(&routes::team_leave(team_id), &leader)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn non_member_leave_returns_404() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let team_id = team["id"].as_i64().unwrap() as i32;

        let (outsider, _) = app.create_qualified_user("out@example.com", "Outsider").await;
        let res = app
            .delete_with_token(&routes::team_leave(team_id), &outsider)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn leave_from_full_team_unlocks_it() {
        let app = TestApp::spawn().await;
        let (leader, _) = app.create_qualified_user("lead@example.com", "Lead Dev").await;
        let team = app.create_team(&leader, 1, "Rustaceans").await;
        let code = team["invite_code"].as_str().unwrap();
        let team_id = team["id"].as_i64().unwrap() as i32;

        let mut members = Vec::new();
        for i in 0..4 {
            let (member, _) = app
                .create_qualified_user(&format!("member{i}@example.com"), "Member")
                .await;
            app.join_team(&member, code).await;
            members.push(member);
        }

        let res = app
            .delete_with_token(&routes::team_leave(team_id), &members[0])
            .await;
        assert_eq!(res.status, 200);

        let res = app.get_with_token(routes::MY_TEAM, &leader).await;
        assert_eq!(res.body["is_locked"], false);
        assert_eq!(res.body["is_complete"], false);

        // The freed slot can be refilled.
        let (replacement, _) = app.create_qualified_user("new@example.com", "New").await;
        let body = app.join_team(&replacement, code).await;
        assert_eq!(body["team"]["is_locked"], true);
    }
}
