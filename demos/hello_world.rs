use lambdarouter::{Context, Method, Request, Router};

use hyper::StatusCode;

fn hello(ctx: &mut Context) -> anyhow::Result<()> {
    ctx.respond(StatusCode::CREATED, "hello world");
    Ok(())
}

fn hello_name(ctx: &mut Context) -> anyhow::Result<()> {
    let name = ctx.param("name").unwrap_or_default().to_owned();
    ctx.respond(StatusCode::OK, format!("hello {}", name));
    Ok(())
}

fn bonjour(ctx: &mut Context) -> anyhow::Result<()> {
    ctx.respond(StatusCode::OK, "bonjour le monde");
    Ok(())
}

fn bonjour_prenom(ctx: &mut Context) -> anyhow::Result<()> {
    let prenom = ctx.param("prenom").unwrap_or_default().to_owned();
    ctx.respond(StatusCode::OK, format!("bonjour {}", prenom));
    Ok(())
}

fn router() -> Result<Router, lambdarouter::Error> {
    let mut router = Router::new("hellosrv")?;
    router.post("hello", hello)?;

    router.group("hello", |r| {
        r.get("{name}", hello_name)?;
        r.put("french", bonjour)?;
        r.get("french/{prenom}", bonjour_prenom)?;
        Ok(())
    })?;

    Ok(router)
}

fn main() -> Result<(), lambdarouter::Error> {
    let router = router()?;

    let requests = vec![
        Request::new(Method::Post, "/hellosrv/hello"),
        Request::new(Method::Get, "/hellosrv/hello/world").with_param("name", "world"),
        Request::new(Method::Put, "/hellosrv/hello/french"),
        Request::new(Method::Get, "/hellosrv/hello/french/monde").with_param("prenom", "monde"),
        Request::new(Method::Delete, "/hellosrv/hello"),
    ];

    for req in requests {
        let line = format!("{} {}", req.method, req.path);
        let res = router.respond(req);
        println!("{:<36} -> {} {}", line, res.status_code, res.body);
    }

    let event = br#"{"httpMethod":"GET","path":"/hellosrv/hello/event","pathParameters":{"name":"event"}}"#;
    println!("{}", String::from_utf8_lossy(&router.invoke(event)?));

    Ok(())
}
