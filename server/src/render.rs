use crate::app_state::EpisodePage;
use crate::app_state::HomePage;
use anyhow::Context;
use minijinja::context;
use minijinja::Environment;

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("episode.html", include_str!("../templates/episode.html")),
    ("not_found.html", include_str!("../templates/not_found.html")),
    ("error.html", include_str!("../templates/error.html")),
];

/// The html renderer
#[derive(Debug)]
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    /// Make a new renderer with all templates loaded.
    pub fn new() -> anyhow::Result<Self> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES.iter().copied() {
            env.add_template(name, source)
                .with_context(|| format!("failed to load template \"{name}\""))?;
        }

        Ok(Self { env })
    }

    fn render<S>(&self, name: &str, ctx: S) -> anyhow::Result<String>
    where
        S: serde::Serialize,
    {
        self.env
            .get_template(name)
            .and_then(|template| template.render(ctx))
            .with_context(|| format!("failed to render template \"{name}\""))
    }

    pub fn home(&self, page: &HomePage) -> anyhow::Result<String> {
        self.render(
            "home.html",
            context! {
                title => "Home",
                latest_episodes => &page.latest_episodes,
                all_episodes => &page.all_episodes,
            },
        )
    }

    pub fn episode(&self, page: &EpisodePage) -> anyhow::Result<String> {
        self.render(
            "episode.html",
            context! {
                title => &page.episode.title,
                episode => &page.episode,
            },
        )
    }

    pub fn not_found(&self) -> anyhow::Result<String> {
        self.render("not_found.html", context! { title => "Não encontrado" })
    }

    pub fn error(&self) -> anyhow::Result<String> {
        self.render("error.html", context! { title => "Erro" })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::app_state::DisplayEpisode;

    fn episode(id: &str) -> DisplayEpisode {
        DisplayEpisode {
            id: id.into(),
            title: format!("Faladev | {id}"),
            members: "Diego Fernandes & Mayk Brito".into(),
            thumbnail: "https://storage.example.com/thumb.jpg".into(),
            published_at: "8 jan 21".into(),
            description: "<p>Uma <strong>conversa</strong>.</p>".into(),
            url: "https://storage.example.com/audio.m4a".into(),
            duration: 4150,
            duration_as_string: "01:09:10".into(),
        }
    }

    #[test]
    fn render_home() {
        let renderer = Renderer::new().expect("failed to load templates");
        let page = HomePage::from_episodes(vec![episode("a"), episode("b"), episode("c")]);

        let html = renderer.home(&page).expect("failed to render");

        assert!(html.contains("Últimos lançamentos"));
        assert!(html.contains("Todos episódios"));
        assert!(html.contains(r#"href="/episode/a""#));
        assert!(html.contains(r#"href="/episode/c""#));
        assert!(html.contains("01:09:10"));
        // Members are text, so they are escaped.
        assert!(html.contains("Diego Fernandes &amp; Mayk Brito"));
    }

    #[test]
    fn render_home_encodes_episode_ids() {
        let renderer = Renderer::new().expect("failed to load templates");
        let page = HomePage::from_episodes(vec![episode("a b"), episode("c d")]);

        let html = renderer.home(&page).expect("failed to render");

        assert!(html.contains(r#"href="/episode/a%20b""#), "{html}");
        assert!(html.contains(r#"href="/episode/c%20d""#), "{html}");
    }

    #[test]
    fn render_episode_keeps_description_html() {
        let renderer = Renderer::new().expect("failed to load templates");
        let page = EpisodePage {
            episode: episode("a"),
        };

        let html = renderer.episode(&page).expect("failed to render");

        assert!(html.contains("<p>Uma <strong>conversa</strong>.</p>"));
        assert!(html.contains("<h1>Faladev | a</h1>"));
        assert!(html.contains("8 jan 21"));
    }

    #[test]
    fn render_error_pages() {
        let renderer = Renderer::new().expect("failed to load templates");

        renderer.not_found().expect("failed to render");
        renderer.error().expect("failed to render");
    }
}
