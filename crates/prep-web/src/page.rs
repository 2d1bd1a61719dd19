//! HTML rendering for the survey page.
//!
//! The page is assembled from plain strings. Handlers gather a [`PageView`]
//! and [`render`] turns it into a complete document; nothing here touches
//! the store.

use std::{collections::BTreeMap, fmt::Write as _};

use prep_analysis::profile::GroupProfile;
use prep_core::{
  Field,
  schema::{InputKind, Section},
};

use crate::charts::series_color;

// ─── View model ──────────────────────────────────────────────────────────────

/// Outcome banner shown above the form after a submission.
#[derive(Debug, Clone)]
pub enum Notice {
  Thanks,
  ConsentRequired,
  Rejected(String),
  StoreFailed,
}

/// A chart that either rendered or failed on its own.
pub type Chart = Result<String, String>;

#[derive(Debug, Clone)]
pub enum GroupingView {
  NotEnoughData { rows: usize, required: usize },
  Ready {
    scatter:  Chart,
    profiles: Vec<GroupProfile>,
  },
  Failed(String),
}

#[derive(Debug, Clone)]
pub struct AnalysisView {
  pub total:     usize,
  pub frequency: Chart,
  pub by_gender: Chart,
  pub by_age:    Chart,
  pub grouping:  GroupingView,
}

/// What the analysis section shows.
#[derive(Debug, Clone)]
pub enum DataView {
  Empty,
  Unavailable(String),
  Ready(Box<AnalysisView>),
}

#[derive(Debug, Clone)]
pub struct PageView {
  pub notice:   Option<Notice>,
  /// Field charted in the frequency section.
  pub selected: Field,
  /// Previous answers, re-selected when the form is shown again.
  pub draft:    BTreeMap<Field, Vec<String>>,
  pub consent:  bool,
  pub data:     DataView,
}

// ─── Escaping ────────────────────────────────────────────────────────────────

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      c => out.push(c),
    }
  }
  out
}

// ─── Document ────────────────────────────────────────────────────────────────

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 0; display: flex; color: #000; background: #fff; }
aside { width: 300px; padding: 1.5rem; background: #f0f2f6; min-height: 100vh; box-sizing: border-box; }
main { flex: 1; padding: 2rem 3rem; max-width: 1100px; }
.main-header { font-size: 2.6rem; color: #1e90ff; text-align: center; margin-bottom: 2rem; }
.section-header { font-size: 1.6rem; color: #4682b4; border-bottom: 2px solid #1e90ff; padding-bottom: 0.5rem; margin-top: 2rem; }
.info-box, .success-box, .error-box, .notice-box { padding: 1rem 1.5rem; border-radius: 0.5rem; margin: 1rem 0; }
.info-box { background: #f0f8ff; border-left: 5px solid #4682b4; }
.success-box { background: #e6f7ff; border-left: 5px solid #1e90ff; }
.error-box { background: #fdecea; border-left: 5px solid #d62728; }
.notice-box { background: #fff8e1; border-left: 5px solid #ffb300; }
.total { background: #e6f7ff; padding: 1rem; border-radius: 0.5rem; text-align: center; }
fieldset { border: none; margin: 0 0 1rem; padding: 0; }
legend { font-weight: bold; margin-bottom: 0.3rem; }
button { background: #1e90ff; color: #fff; font-weight: bold; border: none; padding: 0.8rem 1.5rem; border-radius: 0.5rem; margin-top: 1rem; cursor: pointer; }
button:hover { background: #4682b4; }
table { border-collapse: collapse; margin: 1rem 0; }
td, th { border: 1px solid #ddd; padding: 0.3rem 0.6rem; text-align: left; font-size: 0.9rem; }
.swatch { display: inline-block; width: 0.8rem; height: 0.8rem; border-radius: 50%; margin-right: 0.4rem; }
.charts { display: flex; flex-wrap: wrap; gap: 1rem; }
svg.chart { max-width: 100%; height: auto; }
"#;

/// Render the complete page.
pub fn render(view: &PageView) -> String {
  let mut html = String::with_capacity(32 * 1024);
  html.push_str(
    "<!DOCTYPE html>\n<html lang=\"pt-BR\"><head><meta charset=\"utf-8\">\
     <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
     <title>Pesquisa PrEP/HIV - São Paulo</title><style>",
  );
  html.push_str(STYLE);
  html.push_str("</style></head><body>");

  sidebar(&mut html, view);

  html.push_str("<main>");
  html.push_str(
    r#"<h1 class="main-header">Pesquisa sobre PrEP e Prevenção ao HIV em São Paulo</h1>
<div style="text-align:center;margin-bottom:2rem"><p>Esta pesquisa tem como objetivo mapear o conhecimento sobre PrEP e PEP na população de São Paulo, identificando lacunas de informação e barreiras de acesso.</p><p><strong>Todas as informações são anônimas e confidenciais.</strong></p></div>"#,
  );
  if let Some(notice) = &view.notice {
    notice_box(&mut html, notice);
  }
  form(&mut html, view);
  analysis(&mut html, view);
  html.push_str(
    r#"<hr><div style="text-align:center;margin-top:2rem"><p>Pesquisa sobre Prevenção ao HIV</p></div></main></body></html>"#,
  );
  html
}

// ─── Sidebar ─────────────────────────────────────────────────────────────────

fn sidebar(html: &mut String, view: &PageView) {
  html.push_str(
    r#"<aside><h2>Sobre o Projeto</h2>
<div class="info-box"><h4>Pesquisa sobre Conhecimento de PrEP/PEP</h4><p>Este projeto visa mapear o conhecimento sobre métodos de prevenção ao HIV na população de São Paulo.</p></div>
<details><summary>O que é PrEP e PEP?</summary><h4>PrEP (Profilaxia Pré-Exposição)</h4><p>Uso diário de medicamentos por pessoas HIV-negativas para reduzir o risco de infecção pelo HIV.</p><h4>PEP (Profilaxia Pós-Exposição)</h4><p>Uso emergencial de medicamentos por pessoas que possam ter sido expostas ao HIV, iniciado em até 72 horas após a exposição.</p></details>"#,
  );

  if !matches!(view.data, DataView::Empty) {
    html.push_str(
      r#"<h3>Filtros para Análise</h3><form method="get" action="/"><label for="field">Variável para análise (eixo X):</label><br><select id="field" name="field">"#,
    );
    for field in Field::all() {
      let selected = if field == view.selected { " selected" } else { "" };
      let _ = write!(
        html,
        r#"<option value="{col}"{selected}>{col}</option>"#,
        col = field.column(),
      );
    }
    html.push_str(r#"</select><br><button type="submit">Atualizar</button></form>"#);
    html.push_str(r#"<p><a href="/export">Baixar respostas (CSV)</a></p>"#);
  }
  html.push_str("</aside>");
}

// ─── Notices ─────────────────────────────────────────────────────────────────

fn notice_box(html: &mut String, notice: &Notice) {
  match notice {
    Notice::Thanks => html.push_str(
      r#"<div class="success-box"><h3>Obrigado por participar da pesquisa!</h3><p>Sua contribuição é muito importante para entendermos melhor o conhecimento sobre prevenção ao HIV em nossa comunidade.</p></div>"#,
    ),
    Notice::ConsentRequired => html.push_str(
      r#"<div class="error-box">Você precisa concordar com os termos de consentimento para enviar o formulário.</div>"#,
    ),
    Notice::Rejected(reason) => {
      let _ = write!(
        html,
        r#"<div class="error-box">Resposta inválida: {}</div>"#,
        escape(reason)
      );
    }
    Notice::StoreFailed => html.push_str(
      r#"<div class="error-box">Não foi possível salvar sua resposta. Tente novamente em instantes.</div>"#,
    ),
  }
}

// ─── Form ────────────────────────────────────────────────────────────────────

fn form(html: &mut String, view: &PageView) {
  html.push_str(r#"<form method="post" action="/submit">"#);
  for section in Section::ALL {
    let _ = write!(html, r#"<h2 class="section-header">{}</h2>"#, section.title());
    for field in Field::all().filter(|f| f.section() == section) {
      input(html, field, view.draft.get(&field).map(Vec::as_slice).unwrap_or(&[]));
    }
  }
  let checked = if view.consent { " checked" } else { "" };
  let _ = write!(
    html,
    r#"<div class="info-box"><p><strong>Termo de Consentimento:</strong> Ao enviar este formulário, você concorda em participar desta pesquisa e que seus dados anônimos sejam utilizados para fins de estudo estatístico. Todas as informações são confidenciais e não serão compartilhadas de forma individual.</p></div>
<label><input type="checkbox" name="consent" value="on"{checked}> <strong>Eu concordo em participar da pesquisa</strong></label><br><button type="submit">Enviar Respostas</button></form>"#,
  );
}

fn input(html: &mut String, field: Field, previous: &[String]) {
  let col = field.column();
  let is_previous = |o: &str| previous.iter().any(|p| p == o);
  let _ = write!(html, "<fieldset><legend>{}</legend>", escape(field.prompt()));
  match field.input_kind() {
    InputKind::Radio => {
      // First option preselected, as on a fresh form.
      let pick = field
        .options()
        .iter()
        .position(|o| is_previous(o))
        .unwrap_or(0);
      for (i, option) in field.options().iter().enumerate() {
        let checked = if i == pick { " checked" } else { "" };
        let _ = write!(
          html,
          r#"<label><input type="radio" name="{col}" value="{v}"{checked}> {v}</label><br>"#,
          v = escape(option),
        );
      }
    }
    InputKind::Select => {
      let _ = write!(html, r#"<select name="{col}">"#);
      for option in field.options() {
        let selected = if is_previous(option) { " selected" } else { "" };
        let _ = write!(
          html,
          r#"<option value="{v}"{selected}>{v}</option>"#,
          v = escape(option),
        );
      }
      html.push_str("</select>");
    }
    InputKind::MultiSelect => {
      for option in field.options() {
        let checked = if is_previous(option) { " checked" } else { "" };
        let _ = write!(
          html,
          r#"<label><input type="checkbox" name="{col}" value="{v}"{checked}> {v}</label><br>"#,
          v = escape(option),
        );
      }
    }
  }
  html.push_str("</fieldset>");
}

// ─── Analysis ────────────────────────────────────────────────────────────────

fn chart_or_error(html: &mut String, chart: &Chart, what: &str) {
  match chart {
    Ok(svg) => html.push_str(svg),
    Err(e) => {
      let _ = write!(
        html,
        r#"<div class="error-box">Erro ao criar gráfico {}: {}</div>"#,
        what,
        escape(e)
      );
    }
  }
}

fn analysis(html: &mut String, view: &PageView) {
  let a = match &view.data {
    DataView::Empty => {
      html.push_str(
        r#"<div class="info-box">Não há dados coletados ainda. As visualizações serão exibidas aqui quando houver respostas suficientes.</div>"#,
      );
      return;
    }
    DataView::Unavailable(reason) => {
      let _ = write!(
        html,
        r#"<hr><div class="error-box">Não foi possível carregar as respostas: {}</div>"#,
        escape(reason)
      );
      return;
    }
    DataView::Ready(a) => a,
  };

  let _ = write!(
    html,
    r#"<hr><h2 class="section-header">Análise dos Dados Coletados</h2><div class="total"><h3>Total de Respostas: {}</h3></div>"#,
    a.total
  );

  let _ = write!(html, "<h3>Distribuição de {}</h3>", view.selected.column());
  chart_or_error(html, &a.frequency, "de distribuição");

  html.push_str(r#"<h3>Relação entre Conhecimento e Demografia</h3><div class="charts"><div>"#);
  chart_or_error(html, &a.by_gender, "de gênero");
  html.push_str("</div><div>");
  chart_or_error(html, &a.by_age, "de idade");
  html.push_str("</div></div>");

  grouping(html, &a.grouping);
}

fn grouping(html: &mut String, view: &GroupingView) {
  html.push_str(r#"<h2 class="section-header">Perfis de Respondentes</h2>"#);
  match view {
    GroupingView::NotEnoughData { rows, required } => {
      let _ = write!(
        html,
        r#"<div class="notice-box">Dados insuficientes para agrupar respondentes: {rows} de pelo menos {required} respostas.</div>"#,
      );
    }
    GroupingView::Failed(reason) => {
      let _ = write!(
        html,
        r#"<div class="error-box">Erro ao agrupar respondentes: {}</div>"#,
        escape(reason)
      );
    }
    GroupingView::Ready { scatter, profiles } => {
      html.push_str(
        "<p>Respondentes com respostas parecidas foram reunidos em grupos. \
         Cada ponto é uma resposta, projetada em duas dimensões.</p>",
      );
      chart_or_error(html, scatter, "de grupos");
      profile_table(html, profiles);
    }
  }
}

fn profile_table(html: &mut String, profiles: &[GroupProfile]) {
  const SHOWN: [Field; 5] = [
    Field::PrepKnowledge,
    Field::PepKnowledge,
    Field::Usage,
    Field::AgeBand,
    Field::Gender,
  ];

  html.push_str("<table><thead><tr><th>Grupo</th><th>Perfil</th><th>Respostas</th><th>Pontuação de conhecimento</th>");
  for field in SHOWN {
    let _ = write!(html, "<th>{}</th>", field.column());
  }
  html.push_str("</tr></thead><tbody>");
  for p in profiles {
    let score = p
      .knowledge_score
      .map(|s| format!("{s:.2}"))
      .unwrap_or_else(|| "-".to_owned());
    let _ = write!(
      html,
      r#"<tr><td><span class="swatch" style="background:{color}"></span>{n}</td><td>{label}</td><td>{size}</td><td>{score}</td>"#,
      color = series_color(p.group),
      n = p.group + 1,
      label = escape(&p.label),
      size = p.size,
    );
    for field in SHOWN {
      let value = p.modes.get(&field).map(String::as_str).unwrap_or("-");
      let _ = write!(html, "<td>{}</td>", escape(value));
    }
    html.push_str("</tr>");
  }
  html.push_str("</tbody></table>");
}
