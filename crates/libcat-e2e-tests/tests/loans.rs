use libcat_app::catalog::Page;
use libcat_app::catalog::instance::{RenewalContext, RenewalForm};
use libcat_dal::{
    author::{AuthorRepository, CreateAuthor},
    book::{BookRepository, CreateBook},
    instance::{BookInstance, BookInstanceRepository, CreateBookInstance, Status},
};
use libcat_e2e_tests::{TestUser, client, create_test_user, login, prepare_env, spawn_server};
use time::{Duration, OffsetDateTime, macros::date};
use tracing::info;
use tracing_test::traced_test;
use uuid::Uuid;

fn today() -> time::Date {
    OffsetDateTime::now_utc().date()
}

#[tokio::test]
#[traced_test]
async fn test_loan_workflow() {
    let (args, _config_guard) = prepare_env("test_loan_workflow").await.unwrap();
    let db_url = args.database_url();
    let pool = libcat_dal::new_pool(&db_url).await.unwrap();
    let authors = AuthorRepository::new(pool.clone());
    let books = BookRepository::new(pool.clone());
    let instances = BookInstanceRepository::new(pool.clone());

    let author = authors
        .create(CreateAuthor {
            first_name: "Frank".to_string(),
            last_name: "Herbert".to_string(),
            date_of_birth: None,
            date_of_death: None,
        })
        .await
        .unwrap();
    let book = books
        .create(CreateBook {
            title: "Dune".to_string(),
            author_id: Some(author.id),
            summary: None,
            isbn: "9780441013593".to_string(),
            genres: None,
        })
        .await
        .unwrap();
    let copy1 = instances
        .create(CreateBookInstance {
            book_id: book.id,
            due_back: None,
            status: None,
        })
        .await
        .unwrap();
    let copy2 = instances
        .create(CreateBookInstance {
            book_id: book.id,
            due_back: None,
            status: None,
        })
        .await
        .unwrap();
    let in_maintenance = instances
        .create(CreateBookInstance {
            book_id: book.id,
            due_back: None,
            status: Some(Status::Maintenance),
        })
        .await
        .unwrap();

    let member = create_test_user(&db_url, TestUser::Member).await.unwrap();
    create_test_user(&db_url, TestUser::Librarian).await.unwrap();

    // pre-existing loan, due well before anything borrowed today
    instances
        .borrow(copy2.id, member.id, date!(2030 - 01 - 10))
        .await
        .unwrap();

    let base_url = args.base_url.clone();
    spawn_server(args).await.unwrap();

    // anonymous visitors are sent to the login page
    let anonymous = client().unwrap();
    let response = anonymous
        .get(base_url.join("mybooks").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(303, response.status().as_u16());
    assert_eq!(
        "/auth/login",
        response
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap()
    );

    let member_client = client().unwrap();
    login(&member_client, &base_url, TestUser::Member)
        .await
        .unwrap();

    let borrow_url = base_url
        .join(&format!("book/{}/borrow", copy1.id))
        .unwrap();
    let response = member_client.post(borrow_url.clone()).send().await.unwrap();
    info!("Borrow response: {:#?}", response);
    assert_eq!(303, response.status().as_u16());
    assert_eq!(
        "/mybooks",
        response
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap()
    );

    let response = member_client
        .get(base_url.join("mybooks").unwrap())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let page: Page<BookInstance> = response.json().await.unwrap();
    assert_eq!(page.total, 2);
    // ordered by due date, the old loan comes first
    assert_eq!(page.rows[0].id, copy2.id);
    assert_eq!(page.rows[1].id, copy1.id);
    assert!(page.rows.iter().all(|i| i.status == Status::OnLoan));
    assert_eq!(
        page.rows[1].due_back,
        Some(today() + Duration::weeks(3))
    );
    assert_eq!(
        page.rows[1].borrower.as_ref().unwrap().email,
        TestUser::Member.email()
    );

    // the loan listing order is fixed, explicit sort is refused
    let response = member_client
        .get(base_url.join("mybooks?sort=due_back").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(400, response.status().as_u16());

    // the same copy cannot be borrowed twice, maintenance not at all
    let response = member_client.post(borrow_url).send().await.unwrap();
    assert_eq!(409, response.status().as_u16());
    let response = member_client
        .post(
            base_url
                .join(&format!("book/{}/borrow", in_maintenance.id))
                .unwrap(),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(409, response.status().as_u16());

    // loan management is for librarians only
    let response = member_client
        .get(base_url.join("borrowed_books").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(403, response.status().as_u16());

    let renew_url = base_url.join(&format!("book/{}/renew", copy1.id)).unwrap();
    let response = member_client.get(renew_url.clone()).send().await.unwrap();
    assert_eq!(403, response.status().as_u16());
    let response = anonymous.get(renew_url.clone()).send().await.unwrap();
    assert_eq!(401, response.status().as_u16());

    let librarian_client = client().unwrap();
    login(&librarian_client, &base_url, TestUser::Librarian)
        .await
        .unwrap();

    // the listing shows the librarian's own loans, none so far
    let response = librarian_client
        .get(base_url.join("borrowed_books").unwrap())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let page: Page<BookInstance> = response.json().await.unwrap();
    assert_eq!(page.total, 0);

    // renewal form proposes three weeks from today
    let response = librarian_client.get(renew_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let context: RenewalContext = response.json().await.unwrap();
    assert_eq!(context.book_instance.id, copy1.id);
    assert_eq!(context.form.renewal_date, today() + Duration::weeks(3));
    assert!(context.errors.is_empty());

    // valid renewal moves the due date and redirects to the listing
    let renewal = RenewalForm {
        renewal_date: today() + Duration::weeks(2),
    };
    let response = librarian_client
        .post(renew_url.clone())
        .json(&renewal)
        .send()
        .await
        .unwrap();
    info!("Renew response: {:#?}", response);
    assert_eq!(303, response.status().as_u16());
    assert_eq!(
        "/borrowed_books",
        response
            .headers()
            .get("location")
            .unwrap()
            .to_str()
            .unwrap()
    );
    let current = instances.get(copy1.id).await.unwrap();
    assert_eq!(current.due_back, Some(today() + Duration::weeks(2)));

    // date in the past is rejected and nothing changes
    let renewal = RenewalForm {
        renewal_date: today() - Duration::days(1),
    };
    let response = librarian_client
        .post(renew_url.clone())
        .json(&renewal)
        .send()
        .await
        .unwrap();
    assert_eq!(422, response.status().as_u16());
    let context: RenewalContext = response.json().await.unwrap();
    assert!(!context.errors.is_empty());
    let current = instances.get(copy1.id).await.unwrap();
    assert_eq!(current.due_back, Some(today() + Duration::weeks(2)));

    // unknown copy
    let response = librarian_client
        .post(base_url.join(&format!("book/{}/renew", Uuid::new_v4())).unwrap())
        .json(&RenewalForm {
            renewal_date: today(),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());

    // the form-encoded flavor is accepted too
    let response = librarian_client
        .post(base_url.join(&format!("book/{}/renew", copy2.id)).unwrap())
        .form(&RenewalForm {
            renewal_date: today() + Duration::weeks(1),
        })
        .send()
        .await
        .unwrap();
    assert_eq!(303, response.status().as_u16());
    let current = instances.get(copy2.id).await.unwrap();
    assert_eq!(current.due_back, Some(today() + Duration::weeks(1)));

    // returning the copy frees it
    let return_url = base_url
        .join(&format!("book/{}/return", copy1.id))
        .unwrap();
    let response = librarian_client.post(return_url.clone()).send().await.unwrap();
    assert_eq!(303, response.status().as_u16());
    let current = instances.get(copy1.id).await.unwrap();
    assert_eq!(current.status, Status::Available);
    assert!(current.borrower.is_none());
    assert!(current.due_back.is_none());

    // it cannot be returned twice
    let response = librarian_client.post(return_url).send().await.unwrap();
    assert_eq!(409, response.status().as_u16());
}
